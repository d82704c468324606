//! Concrete plumbing providers and the pipeline that runs all of them once
//! per commit, assembling one [`PlumbingSnapshot`] (spec §4.1).

pub mod identity;
pub mod languages;
pub mod line_stats;
pub mod repo;
pub mod ticks;
pub mod tree_diff;

use std::sync::Arc;

use history_core::model::Commit;
use history_core::plumbing::{
    IdentityProvider, LanguageProvider, LineStatsProvider, NoUast, PlumbingSnapshot,
    TickProvider, TreeDiffProvider, UastProvider,
};

use identity::MailmapIdentityProvider;
use languages::ExtensionLanguageProvider;
use line_stats::BlobLineStatsProvider;
use repo::RepoReader;
use ticks::EpochTickProvider;
use tree_diff::GitTreeDiffProvider;

/// Runs the full plumbing layer against one commit, freezing the result into
/// an immutable [`PlumbingSnapshot`] for the scheduler to hand to a worker
/// (spec §4.1, §3). Owns every provider's mutable state; the scheduler owns
/// exactly one `PlumbingPipeline` and drives it sequentially, one commit at
/// a time, regardless of how analyzer `Consume` calls are scheduled.
pub struct PlumbingPipeline<R: RepoReader> {
    tree_diff: GitTreeDiffProvider<R>,
    line_stats: BlobLineStatsProvider<R>,
    languages: ExtensionLanguageProvider<R>,
    identity: MailmapIdentityProvider,
    ticks: EpochTickProvider,
    uast: Box<dyn UastProvider>,
}

impl<R: RepoReader> PlumbingPipeline<R> {
    pub fn new(repo: Arc<R>, tick_size: std::time::Duration, anonymize: bool) -> Self {
        Self {
            tree_diff: GitTreeDiffProvider::new(repo.clone()),
            line_stats: BlobLineStatsProvider::new(repo.clone()),
            languages: ExtensionLanguageProvider::new(repo),
            identity: MailmapIdentityProvider::new(anonymize),
            ticks: EpochTickProvider::new(tick_size),
            uast: Box::new(NoUast),
        }
    }

    /// Swaps in a real UAST provider; only worth doing when some registered
    /// analyzer declares `needs_uast` (spec §4.1, §B of SPEC_FULL.md).
    pub fn with_uast_provider(mut self, uast: Box<dyn UastProvider>) -> Self {
        self.uast = uast;
        self
    }

    pub fn people(&self) -> &history_core::model::ReversedPeopleDict {
        self.identity.people()
    }

    pub fn into_people(self) -> history_core::model::ReversedPeopleDict {
        self.identity.into_people()
    }

    /// Computes every plumbing fact for one commit. `is_merge_context` is
    /// always `false` here; the scheduler sets it after consulting its own
    /// per-batch merge-replay set (SPEC_FULL.md §D.1).
    pub fn process(&mut self, commit: &dyn Commit) -> PlumbingSnapshot {
        let author = self.identity.resolve(commit);
        let tick = self.ticks.compute(commit);
        self.process_with_identity(commit, author, tick)
    }

    /// Computes every per-commit fact *except* author and tick, which the
    /// caller supplies. The parallel scheduler uses this after a cheap
    /// sequential identity/tick pre-pass, so every fork worker agrees on
    /// one `AuthorId` numbering instead of building disjoint dictionaries
    /// (identity resolution is metadata-only and not worth parallelizing;
    /// tree-diff/line-stats/language detection are the CPU-heavy parts
    /// spec §4.4 actually wants distributed across workers).
    pub fn process_with_identity(
        &mut self,
        commit: &dyn Commit,
        author: history_core::ids::AuthorId,
        tick: history_core::ids::Tick,
    ) -> PlumbingSnapshot {
        let changes = self.tree_diff.compute(commit);
        let line_stats = self.line_stats.compute(&changes);
        let languages = self.languages.compute(&changes);
        let uast = if changes.is_empty() {
            Default::default()
        } else {
            self.uast.compute(&changes)
        };

        PlumbingSnapshot {
            changes,
            author,
            tick,
            languages,
            line_stats,
            uast,
            is_merge_context: false,
        }
    }

    /// Runs only identity resolution and tick assignment for `commit`,
    /// without touching tree-diff/line-stats/languages. Used by the
    /// scheduler's sequential pre-pass ahead of a parallel fork.
    pub fn resolve_identity_and_tick(&mut self, commit: &dyn Commit) -> (history_core::ids::AuthorId, history_core::ids::Tick) {
        (self.identity.resolve(commit), self.ticks.compute(commit))
    }
}
