//! Compact, Bloom-backed set of already-processed merge-commit hashes
//! (spec §4.9). False positives are acceptable — a false positive only
//! drops one duplicate-processing of a merge, which is safe (spec §3, §5).
//! False negatives must never happen.

use history_core::ids::Hash;
use xxhash_rust::xxh3::xxh3_64_with_seed;

const SEED_A: u64 = 0x9E3779B97F4A7C15;
const SEED_B: u64 = 0xC2B2AE3D27D4EB4F;

/// A Bloom filter sized for the expected merges-per-chunk, with a target
/// false-positive rate (spec default: ≤ 1%).
#[derive(Clone, Debug)]
pub struct MergeTracker {
    bits: Vec<u64>,
    num_bits: u64,
    num_hashes: u32,
}

impl MergeTracker {
    /// Size a filter for `expected_items` entries at `false_positive_rate`.
    pub fn new(expected_items: usize, false_positive_rate: f64) -> Self {
        let n = expected_items.max(1) as f64;
        let p = false_positive_rate.clamp(1e-6, 0.5);
        let ln2_sq = std::f64::consts::LN_2 * std::f64::consts::LN_2;
        let num_bits = (-(n * p.ln()) / ln2_sq).ceil().max(64.0) as u64;
        let num_words = num_bits.div_ceil(64);
        let num_bits = num_words * 64;
        let num_hashes = (((num_bits as f64 / n) * std::f64::consts::LN_2).round() as u32).max(1);

        Self {
            bits: vec![0u64; num_words as usize],
            num_bits,
            num_hashes,
        }
    }

    fn indices(&self, hash: &Hash) -> impl Iterator<Item = u64> + '_ {
        let h1 = xxh3_64_with_seed(hash.as_bytes(), SEED_A);
        let h2 = xxh3_64_with_seed(hash.as_bytes(), SEED_B);
        (0..self.num_hashes as u64).map(move |i| h1.wrapping_add(i.wrapping_mul(h2)) % self.num_bits)
    }

    fn get_bit(&self, idx: u64) -> bool {
        let word = (idx / 64) as usize;
        let bit = idx % 64;
        (self.bits[word] >> bit) & 1 == 1
    }

    fn set_bit(&mut self, idx: u64) {
        let word = (idx / 64) as usize;
        let bit = idx % 64;
        self.bits[word] |= 1 << bit;
    }

    /// Returns `true` if `hash` was already present (or a false positive
    /// makes it look that way); inserts it unconditionally either way so a
    /// borderline case never needs a second lookup.
    pub fn seen_or_add(&mut self, hash: &Hash) -> bool {
        let indices: Vec<u64> = self.indices(hash).collect();
        let already = indices.iter().all(|&idx| self.get_bit(idx));
        for idx in indices {
            self.set_bit(idx);
        }
        already
    }

    pub fn contains(&self, hash: &Hash) -> bool {
        self.indices(hash).all(|idx| self.get_bit(idx))
    }

    /// Clears the filter without reallocating (spec §4.9 `Reset`).
    pub fn reset(&mut self) {
        for word in &mut self.bits {
            *word = 0;
        }
    }

    /// `MarshalBinary`: `num_bits: u64 LE | num_hashes: u32 LE | words...`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(12 + self.bits.len() * 8);
        out.extend_from_slice(&self.num_bits.to_le_bytes());
        out.extend_from_slice(&self.num_hashes.to_le_bytes());
        for word in &self.bits {
            out.extend_from_slice(&word.to_le_bytes());
        }
        out
    }

    /// `UnmarshalBinary`. Returns `None` on truncated/malformed input.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < 12 {
            return None;
        }
        let num_bits = u64::from_le_bytes(bytes[0..8].try_into().ok()?);
        let num_hashes = u32::from_le_bytes(bytes[8..12].try_into().ok()?);
        let word_bytes = &bytes[12..];
        if word_bytes.len() % 8 != 0 {
            return None;
        }
        let bits = word_bytes
            .chunks_exact(8)
            .map(|c| u64::from_le_bytes(c.try_into().unwrap()))
            .collect();
        Some(Self {
            bits,
            num_bits,
            num_hashes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idempotence_within_one_chunk() {
        let mut tracker = MergeTracker::new(1000, 0.01);
        let h = Hash::from_bytes([42u8; 20]);
        assert!(!tracker.seen_or_add(&h));
        assert!(tracker.seen_or_add(&h));
    }

    #[test]
    fn reset_clears_without_reallocating() {
        let mut tracker = MergeTracker::new(100, 0.01);
        let h = Hash::from_bytes([1u8; 20]);
        tracker.seen_or_add(&h);
        let word_count_before = tracker.bits.len();
        tracker.reset();
        assert_eq!(tracker.bits.len(), word_count_before);
        assert!(!tracker.seen_or_add(&h));
    }

    #[test]
    fn binary_round_trip() {
        let mut tracker = MergeTracker::new(500, 0.01);
        for i in 0..50u8 {
            tracker.seen_or_add(&Hash::from_bytes([i; 20]));
        }
        let bytes = tracker.to_bytes();
        let restored = MergeTracker::from_bytes(&bytes).unwrap();
        for i in 0..50u8 {
            assert!(restored.contains(&Hash::from_bytes([i; 20])));
        }
    }

    #[test]
    fn false_positive_rate_is_bounded_in_practice() {
        let mut tracker = MergeTracker::new(1000, 0.01);
        for i in 0..1000u32 {
            let mut bytes = [0u8; 20];
            bytes[0..4].copy_from_slice(&i.to_le_bytes());
            tracker.seen_or_add(&Hash::from_bytes(bytes));
        }
        let mut false_positives = 0;
        for i in 1000..2000u32 {
            let mut bytes = [0u8; 20];
            bytes[0..4].copy_from_slice(&i.to_le_bytes());
            if tracker.contains(&Hash::from_bytes(bytes)) {
                false_positives += 1;
            }
        }
        // Allow generous slack over the 1% target; this is a sanity bound,
        // not a tight statistical test.
        assert!(false_positives < 50, "false positives: {false_positives}");
    }
}
