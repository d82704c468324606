//! `TreeDiff` plumbing provider: computes the `Changes` list (with rename
//! detection) between a commit and its primary parent (spec §4.1).

use std::path::PathBuf;
use std::sync::Arc;

use history_core::model::{ChangeAction, ChangeEntry, Commit};
use history_core::plumbing::TreeDiffProvider;
use history_core::types::FxHashMap;

use super::repo::RepoReader;

/// Computes tree diffs against any [`RepoReader`].
pub struct GitTreeDiffProvider<R: RepoReader> {
    repo: Arc<R>,
}

impl<R: RepoReader> GitTreeDiffProvider<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }
}

impl<R: RepoReader> TreeDiffProvider for GitTreeDiffProvider<R> {
    fn compute(&mut self, commit: &dyn Commit) -> Vec<ChangeEntry> {
        let current_entries = self.repo.tree_entries(commit.hash());
        let parent_entries = commit
            .parents()
            .first()
            .map(|&p| self.repo.tree_entries(p))
            .unwrap_or_default();

        let current_map: FxHashMap<PathBuf, history_core::ids::Hash> =
            current_entries.iter().cloned().collect();
        let mut parent_map: FxHashMap<PathBuf, history_core::ids::Hash> =
            parent_entries.iter().cloned().collect();

        let mut parent_by_blob: FxHashMap<history_core::ids::Hash, Vec<PathBuf>> =
            FxHashMap::default();
        for (path, blob) in &parent_entries {
            parent_by_blob.entry(*blob).or_default().push(path.clone());
        }

        let mut matched_parent_paths: std::collections::HashSet<PathBuf> =
            std::collections::HashSet::new();
        let mut changes = Vec::new();

        for (path, blob) in &current_entries {
            match parent_map.get(path) {
                Some(old_blob) if old_blob == blob => {
                    matched_parent_paths.insert(path.clone());
                }
                Some(old_blob) => {
                    matched_parent_paths.insert(path.clone());
                    changes.push(ChangeEntry {
                        action: ChangeAction::Modify,
                        from_path: Some(path.clone()),
                        to_path: Some(path.clone()),
                        from_hash: Some(*old_blob),
                        to_hash: Some(*blob),
                    });
                }
                None => {
                    let rename_source = parent_by_blob.get(blob).and_then(|candidates| {
                        candidates
                            .iter()
                            .find(|p| {
                                !matched_parent_paths.contains(*p) && !current_map.contains_key(*p)
                            })
                            .cloned()
                    });
                    if let Some(old_path) = rename_source {
                        matched_parent_paths.insert(old_path.clone());
                        changes.push(ChangeEntry {
                            action: ChangeAction::Rename,
                            from_path: Some(old_path),
                            to_path: Some(path.clone()),
                            from_hash: Some(*blob),
                            to_hash: Some(*blob),
                        });
                    } else {
                        changes.push(ChangeEntry {
                            action: ChangeAction::Insert,
                            from_path: None,
                            to_path: Some(path.clone()),
                            from_hash: None,
                            to_hash: Some(*blob),
                        });
                    }
                }
            }
        }

        for (path, blob) in parent_map.drain() {
            if !matched_parent_paths.contains(&path) {
                changes.push(ChangeEntry {
                    action: ChangeAction::Delete,
                    from_path: Some(path),
                    to_path: None,
                    from_hash: Some(blob),
                    to_hash: None,
                });
            }
        }

        changes
    }
}
