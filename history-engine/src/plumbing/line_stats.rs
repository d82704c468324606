//! `LineStatsCalculator` plumbing provider: maps each non-delete
//! `ChangeEntry` to a `LineStats` by diffing blob contents line-wise
//! (spec §4.1). Uses `similar`, the same line-diff crate this retrieval
//! pack's blockchain examples (`MystenLabs-sui`, `clockworklabs-SpacetimeDB`)
//! depend on for textual diffing.

use std::sync::Arc;

use history_core::model::{ChangeAction, ChangeEntry, LineStats};
use history_core::plumbing::LineStatsProvider;
use history_core::types::FxHashMap;
use similar::{DiffOp, TextDiff};

use super::repo::RepoReader;

pub struct BlobLineStatsProvider<R: RepoReader> {
    repo: Arc<R>,
}

impl<R: RepoReader> BlobLineStatsProvider<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    fn diff_blobs(&self, from: Option<history_core::ids::Hash>, to: Option<history_core::ids::Hash>) -> LineStats {
        let old_bytes = from.and_then(|h| self.repo.blob_bytes(h)).unwrap_or_else(|| Arc::from(&b""[..]));
        let new_bytes = to.and_then(|h| self.repo.blob_bytes(h)).unwrap_or_else(|| Arc::from(&b""[..]));
        if old_bytes.as_ref() == new_bytes.as_ref() {
            return LineStats::default();
        }
        let old_text = String::from_utf8_lossy(&old_bytes);
        let new_text = String::from_utf8_lossy(&new_bytes);
        let diff = TextDiff::from_lines(old_text.as_ref(), new_text.as_ref());

        let mut stats = LineStats::default();
        for op in diff.ops() {
            match *op {
                DiffOp::Equal { .. } => {}
                DiffOp::Delete { old_len, .. } => stats.removed += old_len as u64,
                DiffOp::Insert { new_len, .. } => stats.added += new_len as u64,
                DiffOp::Replace {
                    old_len, new_len, ..
                } => {
                    let changed = old_len.min(new_len) as u64;
                    stats.changed += changed;
                    if new_len > old_len {
                        stats.added += (new_len - old_len) as u64;
                    } else if old_len > new_len {
                        stats.removed += (old_len - new_len) as u64;
                    }
                }
            }
        }
        stats
    }
}

impl<R: RepoReader> LineStatsProvider for BlobLineStatsProvider<R> {
    fn compute(&mut self, changes: &[ChangeEntry]) -> FxHashMap<history_core::model::ChangeKey, LineStats> {
        let mut out = FxHashMap::default();
        for change in changes {
            if change.action == ChangeAction::Delete {
                continue;
            }
            let stats = self.diff_blobs(change.from_hash, change.to_hash);
            out.insert(change.key(), stats);
        }
        out
    }
}
