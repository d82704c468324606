//! The plumbing layer: shared per-commit facts consumed by every analyzer.
//!
//! Each provider below exposes a pure `compute` function; the scheduler owns
//! a "current value" slot per provider, writes it once per commit, and then
//! freezes everything into a [`PlumbingSnapshot`] shared read-only with the
//! worker running one analyzer's `Consume` (spec §4.1).

use std::sync::Arc;

use crate::ids::{AuthorId, Hash, Tick};
use crate::model::{ChangeEntry, ChangeKey, Commit, LineStats};
use crate::types::FxHashMap;

/// Parsed UAST roots for one changed blob, before and after the commit.
/// Only populated when some registered analyzer declares `needs_uast`
/// (spec §4.1, §B of SPEC_FULL.md). The node representation itself is an
/// external collaborator's concern (spec §1b); we carry it as an opaque
/// blob so this crate never depends on a UAST parser.
#[derive(Clone, Debug, Default)]
pub struct UastChange {
    pub before: Option<Arc<[u8]>>,
    pub after: Option<Arc<[u8]>>,
}

/// Immutable bundle of the per-commit facts a worker needs to replay one
/// commit. Owned exclusively by the scheduler until applied to a worker;
/// released by the scheduler after the worker is done (spec §3).
#[derive(Clone, Debug, Default)]
pub struct PlumbingSnapshot {
    pub changes: Vec<ChangeEntry>,
    pub author: AuthorId,
    pub tick: Tick,
    pub languages: FxHashMap<Hash, String>,
    pub line_stats: FxHashMap<ChangeKey, LineStats>,
    pub uast: FxHashMap<ChangeKey, UastChange>,
    /// True when the scheduler has determined this `Consume` call replays a
    /// merge commit onto a branch other than the one that first produced its
    /// contribution (SPEC_FULL.md §D.1). Line statistics must not be folded
    /// a second time when this is set.
    pub is_merge_context: bool,
}

impl PlumbingSnapshot {
    /// Look up the language for one change, defaulting to "" ("unknown",
    /// resolved downstream to "Other") when the blob hash is absent from
    /// the language map.
    pub fn language_for(&self, change: &ChangeEntry) -> &str {
        change
            .language_key()
            .and_then(|h| self.languages.get(&h))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn line_stats_for(&self, change: &ChangeEntry) -> Option<LineStats> {
        self.line_stats.get(&change.key()).copied()
    }
}

/// Computes the tree-diff `Changes` list between a commit and its primary
/// parent, including rename detection (spec §4.1 TreeDiff).
pub trait TreeDiffProvider: Send {
    fn compute(&mut self, commit: &dyn Commit) -> Vec<ChangeEntry>;
}

/// Maps each non-delete [`ChangeEntry`] to a [`LineStats`] triple by diffing
/// blob contents line-wise (spec §4.1 LineStatsCalculator).
pub trait LineStatsProvider: Send {
    fn compute(&mut self, changes: &[ChangeEntry]) -> FxHashMap<ChangeKey, LineStats>;
}

/// Maps blob hash to language string via extension plus content heuristics;
/// empty string denotes "unknown" (spec §4.1 LanguagesDetection).
pub trait LanguageProvider: Send {
    fn compute(&mut self, changes: &[ChangeEntry]) -> FxHashMap<Hash, String>;
}

/// Resolves a commit's author signature to an [`AuthorId`] using a mail-map
/// plus name-normalization heuristics; assigns a fresh id and appends to the
/// `ReversedPeopleDict` on first sighting (spec §4.1 IdentityDetector).
pub trait IdentityProvider: Send {
    fn resolve(&mut self, commit: &dyn Commit) -> AuthorId;
}

/// Computes the tick index from commit author time and the configured
/// epoch/tick-size (spec §4.1 TicksSinceStart).
pub trait TickProvider: Send {
    fn compute(&mut self, commit: &dyn Commit) -> Tick;
}

/// Parses each changed blob into a UAST root; exposes before/after roots
/// per change. Only invoked when `needs_uast` is declared by some analyzer
/// (spec §4.1 UASTChangesAnalyzer).
pub trait UastProvider: Send {
    fn compute(&mut self, changes: &[ChangeEntry]) -> FxHashMap<ChangeKey, UastChange>;
}

/// No-op [`UastProvider`] used when no registered analyzer needs UAST data,
/// so the rest of the pipeline never takes a hard dependency on a parser.
#[derive(Default)]
pub struct NoUast;

impl UastProvider for NoUast {
    fn compute(&mut self, _changes: &[ChangeEntry]) -> FxHashMap<ChangeKey, UastChange> {
        FxHashMap::default()
    }
}
