//! The `HistoryAnalyzer` capability set (spec §4.2).
//!
//! Rust has no implicit base-class mixin, so the shared plumbing the
//! original system hangs off a "history analyzer" mixin is expressed here
//! as a trait plus a small [`AnalyzerBase`] value that concrete analyzers
//! hold by composition (spec §9 "Deep inheritance").
//!
//! `PlumbingSnapshot` lifecycle (`SnapshotPlumbing`/`ApplySnapshot`/
//! `ReleaseSnapshot` in the source system) is implicit here: the scheduler
//! builds one `PlumbingSnapshot`, passes it to `consume` by shared
//! reference, and drops it after `merge` — ownership and `Drop` do the work
//! those three methods did explicitly in a garbage-collected runtime.

use std::path::PathBuf;
use std::time::Duration;

use crate::ids::Hash;
use crate::model::{Commit, ReversedPeopleDict};
use crate::plumbing::PlumbingSnapshot;
use crate::tc::{Report, Tc, TickPayload};
use crate::types::FxHashMap;

/// Reporting granularity hint carried in a [`Descriptor`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnalyzerMode {
    /// `Consume` produces one contribution per commit.
    PerCommit,
    /// The analyzer only reports aggregated, per-tick state.
    PerTick,
}

/// `{id, mode, description}` — spec §4.2.
#[derive(Clone, Debug)]
pub struct Descriptor {
    pub id: &'static str,
    pub mode: AnalyzerMode,
    pub description: &'static str,
}

/// Process-wide facts every analyzer's `Configure` consumes (spec §4.2).
#[derive(Clone, Debug, Default)]
pub struct ProcessFacts {
    pub tick_size: Duration,
    pub people: ReversedPeopleDict,
    pub commits_by_tick: FxHashMap<crate::ids::Tick, Vec<Hash>>,
}

/// Parameters for [`HistoryAnalyzer::new_aggregator`] (spec §6 `spill_budget`,
/// `spill_dir`).
#[derive(Clone, Debug)]
pub struct AggregatorOptions {
    pub spill_budget: u64,
    pub spill_dir: PathBuf,
}

/// Shared function pointers every concrete analyzer composes rather than
/// inherits (spec §9). Holds the facts captured at `Configure` time.
#[derive(Clone, Debug, Default)]
pub struct AnalyzerBase {
    pub facts: ProcessFacts,
}

impl AnalyzerBase {
    pub fn configure(&mut self, facts: &ProcessFacts) {
        self.facts = facts.clone();
    }
}

/// The capability set every history analyzer satisfies (spec §4.2).
pub trait HistoryAnalyzer: Send {
    /// Per-commit contribution payload (the `data` field of a `Tc`).
    type Contribution: Send + 'static;
    /// Per-tick aggregated state (the `data` field of a `TickPayload`).
    type TickState: Send + Default + 'static;
    /// Concrete aggregator type this analyzer constructs via
    /// `new_aggregator`. Kept associated (rather than a fixed type from this
    /// crate) so `history-engine`'s generic `Aggregator<C, S>` can plug in
    /// here without `history-core` depending on `history-engine`.
    type Aggregator;

    fn descriptor(&self) -> Descriptor;

    /// Consume process-wide facts (tick size, people dict, commits-by-tick).
    fn configure(&mut self, facts: &ProcessFacts);

    /// One-time setup; may register plot-section renderers.
    fn initialize(&mut self) {}

    /// Produce one TC for the given commit. Must be pure in analyzer state
    /// plus plumbing snapshot. May return an empty TC to skip.
    fn consume(&mut self, commit: &dyn Commit, snapshot: &PlumbingSnapshot) -> Tc<Self::Contribution>;

    /// Return `n` independent clones; each clone owns independent mutable
    /// state and fresh plumbing instances. Merge-tracker state is *not*
    /// shared — each fork processes a disjoint commit subset.
    fn fork(&self, n: usize) -> Vec<Self>
    where
        Self: Sized;

    /// Combine branch results into the receiver. Required associative and
    /// commutative over branches.
    fn merge(&mut self, branches: Vec<Self>)
    where
        Self: Sized;

    /// Scheduling hint: this analyzer must run single-threaded.
    fn sequential_only(&self) -> bool {
        false
    }

    /// Scheduling hint: this analyzer's `Consume` is CPU-bound and should be
    /// weighted accordingly when sizing worker pools.
    fn cpu_heavy(&self) -> bool {
        false
    }

    /// Chunk-boundary hook (spec §4.5): reset the merge tracker and any
    /// transient per-commit accumulators that the next chunk will rebuild.
    /// Aggregator state is never touched here.
    fn hibernate(&mut self) {}

    /// Chunk-boundary hook: re-initialize anything `hibernate` cleared
    /// (spec §4.5). Most analyzers can share one implementation with
    /// `hibernate` since a fresh merge tracker looks the same either way.
    fn boot(&mut self) {}

    /// Declares whether this analyzer needs parsed UAST roots in the
    /// plumbing snapshot (spec §4.1 UASTChangesAnalyzer gate).
    fn needs_uast(&self) -> bool {
        false
    }

    /// Construct the aggregator for this analyzer.
    fn new_aggregator(&self, opts: AggregatorOptions) -> Self::Aggregator;

    /// Collapse a sequence of TICKs into the canonical `Report`.
    fn ticks_to_report(&self, ticks: &[TickPayload<Self::TickState>]) -> Report;
}
