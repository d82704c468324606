//! Opaque identifiers: commit `Hash`, `Tick` index, `AuthorId`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A 20-byte commit identifier. Byte-wise `Eq`/`Ord`. The all-zero value is
/// distinguished and means "no hash" (see [`Hash::NONE`]).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Hash([u8; 20]);

impl Hash {
    /// The zero hash, used as a sentinel for "no hash" (e.g. a synthetic TC).
    pub const NONE: Hash = Hash([0u8; 20]);

    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Hash(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn is_none(&self) -> bool {
        *self == Self::NONE
    }
}

impl Default for Hash {
    fn default() -> Self {
        Self::NONE
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", hex::encode(self.0))
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl FromStr for Hash {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(Hash(bytes))
    }
}

/// Non-negative tick index. Tick 0 begins at the configured epoch.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct Tick(pub u32);

impl Tick {
    pub const ZERO: Tick = Tick(0);

    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Index into a [`ReversedPeopleDict`](crate::model::ReversedPeopleDict).
/// The sentinel [`AuthorId::MISSING`] denotes "unresolvable".
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct AuthorId(pub i32);

impl AuthorId {
    pub const MISSING: AuthorId = AuthorId(-1);

    pub fn is_missing(self) -> bool {
        self == Self::MISSING
    }

    /// Decimal-bytes representation, used as the HyperLogLog hash key
    /// (spec §4.7 "Cardinality estimates").
    pub fn decimal_bytes(self) -> Vec<u8> {
        self.0.to_string().into_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_roundtrips_through_hex() {
        let h = Hash::from_bytes([7u8; 20]);
        let s = h.to_string();
        assert_eq!(s.parse::<Hash>().unwrap(), h);
    }

    #[test]
    fn zero_hash_is_none() {
        assert!(Hash::default().is_none());
        assert!(Hash::NONE.is_none());
        assert!(!Hash::from_bytes([1u8; 20]).is_none());
    }

    #[test]
    fn author_missing_sentinel() {
        assert!(AuthorId::MISSING.is_missing());
        assert!(!AuthorId(0).is_missing());
    }
}
