//! Churn score (spec §4.7 "Churn score (file history)"): ranks files as
//! hotspots by commit frequency plus lines touched.

use crate::parse::FileChurnEntry;
use crate::records::ChurnRecord;

/// `score = commits + (added + removed + changed) / 100`, descending.
pub fn churn_records(files: &[FileChurnEntry]) -> Vec<ChurnRecord> {
    let mut records: Vec<ChurnRecord> = files
        .iter()
        .map(|f| ChurnRecord {
            file: f.file.clone(),
            commits: f.commits,
            lines: f.lines,
            score: f.commits as f64 + f.lines.total() as f64 / 100.0,
        })
        .collect();
    records.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    records
}
