//! The `RepoReader` external collaborator interface (spec §6 "Input: a
//! Git-like repository exposing commit iteration, tree/blob read, and
//! diff"). The actual object store and diff engine are out of scope
//! (spec §1a); this trait is the seam the in-scope plumbing providers
//! compute against.

use std::path::PathBuf;
use std::sync::Arc;

use history_core::ids::Hash;

/// Read access to tree and blob state. A real implementation walks Git
/// packfiles; [`InMemoryRepo`] below is a deterministic test double.
pub trait RepoReader: Send + Sync {
    /// Full path -> blob-hash listing of the tree at `commit`.
    fn tree_entries(&self, commit: Hash) -> Vec<(PathBuf, Hash)>;

    /// Raw bytes of one blob, if known.
    fn blob_bytes(&self, blob: Hash) -> Option<Arc<[u8]>>;
}

/// An in-memory `RepoReader` used by tests and by callers embedding a
/// fully pre-materialized commit history (e.g. replaying a checkpointed
/// run). Trees and blobs are supplied up front; there is no lazy loading.
#[derive(Default)]
pub struct InMemoryRepo {
    trees: history_core::types::FxHashMap<Hash, Vec<(PathBuf, Hash)>>,
    blobs: history_core::types::FxHashMap<Hash, Arc<[u8]>>,
}

impl InMemoryRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_tree(&mut self, commit: Hash, entries: Vec<(PathBuf, Hash)>) {
        self.trees.insert(commit, entries);
    }

    pub fn put_blob(&mut self, blob: Hash, bytes: impl Into<Arc<[u8]>>) {
        self.blobs.insert(blob, bytes.into());
    }
}

impl RepoReader for InMemoryRepo {
    fn tree_entries(&self, commit: Hash) -> Vec<(PathBuf, Hash)> {
        self.trees.get(&commit).cloned().unwrap_or_default()
    }

    fn blob_bytes(&self, blob: Hash) -> Option<Arc<[u8]>> {
        self.blobs.get(&blob).cloned()
    }
}
