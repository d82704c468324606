//! Cardinality estimates for `EstimatedTotalDevelopers` and
//! `EstimatedActiveDevelopers` (spec §4.7), backed by the same HyperLogLog
//! sketch the engine uses for commit-path cardinality (spec §4.10).

use history_core::ids::AuthorId;
use history_engine::HyperLogLog;

const PRECISION: u32 = 14;

/// Estimates the number of distinct authors in `author_ids`, and separately
/// among the subset whose id appears in `active_author_ids`.
pub fn estimate_developer_counts(author_ids: &[i32], active_author_ids: &[i32]) -> (f64, f64) {
    let total = HyperLogLog::new(PRECISION);
    for &id in author_ids {
        total.add(&AuthorId(id).decimal_bytes());
    }

    let active = HyperLogLog::new(PRECISION);
    for &id in active_author_ids {
        active.add(&AuthorId(id).decimal_bytes());
    }

    (total.count(), active.count())
}
