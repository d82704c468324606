//! HyperLogLog cardinality sketch with LogLog-Beta bias correction
//! (spec §4.10). Thread-safe for concurrent `Add`/`Merge`/`Count` callers.

use parking_lot::RwLock;

const FNV_OFFSET_BASIS: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x100000001b3;

fn fnv1a_64(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    for &b in bytes {
        hash ^= b as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Three xor-shift-multiply rounds, finalizing the FNV-1a hash so both the
/// `p` index bits and the `64 - p` leading-zero-count bits see avalanche
/// (spec §4.10).
fn splitmix64_finalize(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E3779B97F4A7C15);
    x = (x ^ (x >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94D049BB133111EB);
    x ^ (x >> 31)
}

fn hash_key(key: &[u8]) -> u64 {
    splitmix64_finalize(fnv1a_64(key))
}

fn index_and_rank(hash: u64, precision: u32) -> (usize, u8) {
    let idx = (hash & ((1u64 << precision) - 1)) as usize;
    let w = hash >> precision;
    let max_rank = (64 - precision) as u8 + 1;
    let rank = if w == 0 {
        max_rank
    } else {
        (w.leading_zeros() as u8).saturating_sub(precision as u8) + 1
    };
    (idx, rank.min(max_rank))
}

struct Registers {
    precision: u32,
    slots: Vec<u8>,
}

/// A HyperLogLog sketch. `precision` must be in `[4, 18]`, allocating
/// `2^precision` single-byte registers (default precision 14, ~16 KB,
/// ~0.8% standard error).
pub struct HyperLogLog {
    inner: RwLock<Registers>,
}

impl HyperLogLog {
    pub fn new(precision: u32) -> Self {
        assert!((4..=18).contains(&precision), "precision out of range [4, 18]");
        Self {
            inner: RwLock::new(Registers {
                precision,
                slots: vec![0u8; 1usize << precision],
            }),
        }
    }

    pub fn precision(&self) -> u32 {
        self.inner.read().precision
    }

    /// Add one key to the sketch.
    pub fn add(&self, key: &[u8]) {
        let mut regs = self.inner.write();
        let p = regs.precision;
        let hash = hash_key(key);
        let (idx, rank) = index_and_rank(hash, p);
        if regs.slots[idx] < rank {
            regs.slots[idx] = rank;
        }
    }

    /// Merge another sketch into this one. Requires equal precision.
    pub fn merge(&self, other: &HyperLogLog) -> Result<(), PrecisionMismatch> {
        let mut mine = self.inner.write();
        let theirs = other.inner.read();
        if mine.precision != theirs.precision {
            return Err(PrecisionMismatch {
                expected: mine.precision,
                actual: theirs.precision,
            });
        }
        for (a, b) in mine.slots.iter_mut().zip(theirs.slots.iter()) {
            if *b > *a {
                *a = *b;
            }
        }
        Ok(())
    }

    /// Estimate cardinality via the LogLog-Beta polynomial (Qin et al.,
    /// 2016), which corrects bias across all cardinality ranges without a
    /// piecewise bias-correction table.
    pub fn count(&self) -> f64 {
        let regs = self.inner.read();
        let m = regs.slots.len() as f64;
        let mut sum_inv = 0.0f64;
        let mut zeros = 0u32;
        for &r in &regs.slots {
            sum_inv += 2f64.powi(-(r as i32));
            if r == 0 {
                zeros += 1;
            }
        }
        let ez = zeros as f64;
        let alpha_inf = 0.5 / std::f64::consts::LN_2;
        let estimate = alpha_inf * m * (m - ez) / (beta(ez) + sum_inv);
        estimate.max(0.0)
    }
}

/// The LogLog-Beta correction polynomial, in `zl = ln(ez + 1)`.
fn beta(ez: f64) -> f64 {
    let zl = (ez + 1.0).ln();
    let zl2 = zl * zl;
    let zl3 = zl2 * zl;
    let zl4 = zl3 * zl;
    let zl5 = zl4 * zl;
    let zl6 = zl5 * zl;
    let zl7 = zl6 * zl;
    -0.370393911 * ez
        + 0.070471823 * zl
        + 0.17393686 * zl2
        + 0.16339839 * zl3
        - 0.09237745 * zl4
        + 0.03738027 * zl5
        - 0.005384159 * zl6
        + 0.00042419 * zl7
}

#[derive(Debug, thiserror::Error)]
#[error("HLL precision mismatch: expected {expected}, got {actual}")]
pub struct PrecisionMismatch {
    pub expected: u32,
    pub actual: u32,
}
