//! The commit-history data model: line stats, tree changes, author identity.

use std::ops::{Add, AddAssign};
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{AuthorId, Hash};

/// `{added, removed, changed}` triple of non-negative line counts.
///
/// Sum is associative and commutative over distinct files; within one file
/// per commit there is exactly one `LineStats` triple (spec §3).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineStats {
    pub added: u64,
    pub removed: u64,
    pub changed: u64,
}

impl LineStats {
    pub fn new(added: u64, removed: u64, changed: u64) -> Self {
        Self {
            added,
            removed,
            changed,
        }
    }

    pub fn total(&self) -> u64 {
        self.added + self.removed + self.changed
    }
}

impl Add for LineStats {
    type Output = LineStats;

    fn add(self, rhs: LineStats) -> LineStats {
        LineStats {
            added: self.added + rhs.added,
            removed: self.removed + rhs.removed,
            changed: self.changed + rhs.changed,
        }
    }
}

impl AddAssign for LineStats {
    fn add_assign(&mut self, rhs: LineStats) {
        *self = *self + rhs;
    }
}

impl std::iter::Sum for LineStats {
    fn sum<I: Iterator<Item = LineStats>>(iter: I) -> Self {
        iter.fold(LineStats::default(), Add::add)
    }
}

/// A file-tree operation kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeAction {
    Insert,
    Modify,
    Delete,
    Rename,
}

/// One entry of a commit's tree diff. Renames carry both paths; inserts
/// carry only `to_*`; deletes carry only `from_*` (spec §3).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEntry {
    pub action: ChangeAction,
    pub from_path: Option<PathBuf>,
    pub to_path: Option<PathBuf>,
    pub from_hash: Option<Hash>,
    pub to_hash: Option<Hash>,
}

impl ChangeEntry {
    /// The path a downstream file-history table should key on: the
    /// post-change path, falling back to the pre-change path for deletes.
    pub fn current_path(&self) -> Option<&PathBuf> {
        self.to_path.as_ref().or(self.from_path.as_ref())
    }

    /// A key under which this change's [`LineStats`] can be looked up in a
    /// [`PlumbingSnapshot`](crate::plumbing::PlumbingSnapshot)'s line-stats map.
    pub fn key(&self) -> ChangeKey {
        ChangeKey {
            from_hash: self.from_hash.unwrap_or(Hash::NONE),
            to_hash: self.to_hash.unwrap_or(Hash::NONE),
        }
    }

    /// The blob hash whose content determines this change's language,
    /// i.e. the post-change blob, falling back to the pre-change blob for
    /// deletes (spec §4.1 LanguagesDetection maps blob hash to language).
    pub fn language_key(&self) -> Option<Hash> {
        self.to_hash.or(self.from_hash)
    }
}

/// Key identifying one [`ChangeEntry`] within a single commit's diff, used to
/// index the per-commit line-stats map (spec §4.1).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChangeKey {
    pub from_hash: Hash,
    pub to_hash: Hash,
}

/// An author or committer signature as attached to a commit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub name: String,
    pub email: String,
    pub when: DateTime<Utc>,
}

/// The external collaborator's commit contract (spec §3: "opaque; provided
/// by external collaborator").
pub trait Commit {
    fn hash(&self) -> Hash;
    fn parents(&self) -> &[Hash];
    fn author_signature(&self) -> &Signature;
    fn message(&self) -> &str;

    fn is_merge(&self) -> bool {
        self.parents().len() > 1
    }
}

/// Ordered list of canonical developer names, indexed by [`AuthorId`].
/// Appended to, never reordered, by the identity detector on first sighting
/// of a new author.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ReversedPeopleDict {
    names: Vec<String>,
}

impl ReversedPeopleDict {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: AuthorId) -> Option<&str> {
        if id.is_missing() {
            return None;
        }
        self.names.get(id.0 as usize).map(String::as_str)
    }

    pub fn push(&mut self, name: String) -> AuthorId {
        let id = AuthorId(self.names.len() as i32);
        self.names.push(name);
        id
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (AuthorId, &str)> {
        self.names
            .iter()
            .enumerate()
            .map(|(i, n)| (AuthorId(i as i32), n.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_stats_sum_is_associative() {
        let a = LineStats::new(1, 2, 3);
        let b = LineStats::new(4, 5, 6);
        let c = LineStats::new(7, 8, 9);
        assert_eq!((a + b) + c, a + (b + c));
    }

    #[test]
    fn people_dict_assigns_ids_in_order() {
        let mut dict = ReversedPeopleDict::new();
        let alice = dict.push("Alice".to_string());
        let bob = dict.push("Bob".to_string());
        assert_eq!(alice, AuthorId(0));
        assert_eq!(bob, AuthorId(1));
        assert_eq!(dict.get(alice), Some("Alice"));
        assert_eq!(dict.get(AuthorId::MISSING), None);
    }
}
