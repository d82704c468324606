//! Scheduler / fork-merge driver (spec §4.4). Owns the commit stream and
//! dispatches it to one analyzer clone (sequential mode) or `n` clones
//! running on parallel OS threads (parallel mode), merging their results
//! back onto the primary.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use history_core::analyzer::HistoryAnalyzer;
use history_core::errors::{AggregatorError, SchedulerError};
use history_core::ids::Hash;
use history_core::model::Commit;
use history_core::tc::Tc;
use history_core::types::FxHashSet;

use crate::aggregate::{Aggregator, AggregatorSpec};
use crate::plumbing::repo::RepoReader;
use crate::plumbing::PlumbingPipeline;

/// Drives one analyzer + its aggregator across a commit stream.
///
/// `Spec` is the [`AggregatorSpec`] whose `Contribution`/`State` match the
/// analyzer's associated types; this crate only ever instantiates the
/// scheduler for the `devs` analyzer (spec §4.2's "representative"), so a
/// concrete-enough bound here is preferable to a fully abstract one.
pub struct Scheduler<A, Spec, R>
where
    A: HistoryAnalyzer<Aggregator = Aggregator<Spec>>,
    Spec: AggregatorSpec<Contribution = A::Contribution, State = A::TickState>,
    R: RepoReader,
{
    analyzer: A,
    aggregator: Aggregator<Spec>,
    repo: Arc<R>,
    tick_size: Duration,
    anonymize: bool,
    pipeline: PlumbingPipeline<R>,
    /// Per-round merge-context labeling (SPEC_FULL.md §D.1): distinct from
    /// the analyzer's own Bloom-backed `MergeTracker`. Reset at the start of
    /// every `run_sequential`/`run_parallel` call.
    merge_context: FxHashSet<Hash>,
    cancelled: Arc<AtomicBool>,
}

impl<A, Spec, R> Scheduler<A, Spec, R>
where
    A: HistoryAnalyzer<Aggregator = Aggregator<Spec>> + Clone + Send,
    Spec: AggregatorSpec<Contribution = A::Contribution, State = A::TickState> + Send,
    R: RepoReader,
{
    pub fn new(mut analyzer: A, repo: Arc<R>, tick_size: Duration, anonymize: bool, aggregator: Aggregator<Spec>) -> Self {
        let facts = history_core::analyzer::ProcessFacts {
            tick_size,
            ..Default::default()
        };
        analyzer.configure(&facts);
        let pipeline = PlumbingPipeline::new(repo.clone(), tick_size, anonymize);
        Self {
            analyzer,
            aggregator,
            repo,
            tick_size,
            anonymize,
            pipeline,
            merge_context: FxHashSet::default(),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn cancellation_handle(&self) -> Arc<AtomicBool> {
        self.cancelled.clone()
    }

    pub fn analyzer(&self) -> &A {
        &self.analyzer
    }

    pub fn aggregator_mut(&mut self) -> &mut Aggregator<Spec> {
        &mut self.aggregator
    }

    pub fn people(&self) -> history_core::model::ReversedPeopleDict {
        self.pipeline.people().clone()
    }

    /// Re-`Configure`s the analyzer with the people dict accumulated so
    /// far. Call this once after the commit stream is exhausted and before
    /// `ticks_to_report`, since `people` only reaches its final size once
    /// every commit has been through identity resolution.
    pub fn finalize_facts(&mut self) {
        let facts = history_core::analyzer::ProcessFacts {
            tick_size: self.tick_size,
            people: self.pipeline.people().clone(),
            commits_by_tick: history_core::types::FxHashMap::default(),
        };
        self.analyzer.configure(&facts);
    }

    /// Chunk-boundary lifecycle hook (spec §4.5): resets the analyzer's
    /// merge tracker and this scheduler's per-round merge-context set, and
    /// gives the aggregator a chance to free memory.
    pub fn hibernate(&mut self) -> Result<u64, AggregatorError> {
        self.analyzer.hibernate();
        self.merge_context.clear();
        let spilled = self.aggregator.spill()?;
        tracing::debug!(spilled_bytes = spilled, "scheduler hibernating");
        Ok(spilled)
    }

    /// Re-initializes anything `hibernate` cleared, at the start of the
    /// next chunk (spec §4.5).
    pub fn boot(&mut self) {
        self.analyzer.boot();
        tracing::debug!("scheduler booted");
    }

    /// Single-threaded mode: one worker processes commits in order,
    /// plumbing is written in place (spec §4.4 "Sequential").
    pub fn run_sequential<'c, I>(&mut self, commits: I) -> Result<(), SchedulerError>
    where
        I: IntoIterator<Item = &'c dyn Commit>,
    {
        for commit in commits {
            if self.cancelled.load(Ordering::Relaxed) {
                return Err(SchedulerError::Cancelled);
            }
            let mut snapshot = self.pipeline.process(commit);
            snapshot.is_merge_context = !self.merge_context.insert(commit.hash());
            let tc = self.analyzer.consume(commit, &snapshot);
            feed(&mut self.aggregator, tc)?;
        }
        Ok(())
    }

    /// Parallel mode (spec §4.4 "Parallel"): partitions `commits` into `n`
    /// contiguous, disjoint segments, forks the analyzer, runs each clone
    /// on its own OS thread with a worker-local plumbing pipeline, then
    /// merges clones back onto the primary. TCs from every worker are fed
    /// to the aggregator afterward in no particular cross-worker order —
    /// `Aggregator::merge` must not depend on it (spec §5).
    pub fn run_parallel<'c>(&mut self, commits: &[&'c dyn Commit], workers: usize) -> Result<(), SchedulerError>
    where
        R: Sync,
    {
        if self.cancelled.load(Ordering::Relaxed) {
            return Err(SchedulerError::Cancelled);
        }
        let workers = workers.max(1).min(commits.len().max(1));
        if workers <= 1 || commits.len() < 2 {
            return self.run_sequential(commits.iter().copied());
        }

        // Identity resolution and tick assignment are metadata-only and
        // strictly sequential in nature (a shared `ReversedPeopleDict`
        // numbering); resolve them up front so every fork worker agrees,
        // then distribute only the CPU-heavy tree-diff/line-stats/language
        // work (spec §4.4).
        let mut identities = history_core::types::FxHashMap::default();
        for &commit in commits {
            identities.insert(commit.hash(), self.pipeline.resolve_identity_and_tick(commit));
        }

        let clones = self.analyzer.fork(workers);
        let chunks = partition_contiguous(commits, workers);
        let merge_context: Mutex<FxHashSet<Hash>> = Mutex::new(std::mem::take(&mut self.merge_context));
        let repo = &self.repo;
        let tick_size = self.tick_size;
        let anonymize = self.anonymize;
        let cancelled = &self.cancelled;
        let identities = &identities;

        let worker_results: Vec<(A, Vec<Tc<A::Contribution>>)> = std::thread::scope(|scope| {
            let handles: Vec<_> = clones
                .into_iter()
                .zip(chunks)
                .map(|(mut clone_analyzer, chunk)| {
                    let merge_context = &merge_context;
                    let repo = Arc::clone(repo);
                    let cancelled = Arc::clone(cancelled);
                    scope.spawn(move || {
                        let mut local_pipeline = PlumbingPipeline::new(repo, tick_size, anonymize);
                        let mut tcs = Vec::with_capacity(chunk.len());
                        for &commit in chunk {
                            if cancelled.load(Ordering::Relaxed) {
                                break;
                            }
                            let (author, tick) = identities[&commit.hash()];
                            let mut snapshot = local_pipeline.process_with_identity(commit, author, tick);
                            let already = {
                                let mut guard = merge_context.lock().unwrap_or_else(|poison| poison.into_inner());
                                !guard.insert(commit.hash())
                            };
                            snapshot.is_merge_context = already;
                            tcs.push(clone_analyzer.consume(commit, &snapshot));
                        }
                        (clone_analyzer, tcs)
                    })
                })
                .collect();

            handles
                .into_iter()
                .map(|h| h.join().map_err(|_| SchedulerError::WorkerPanic { segment: "fork".to_string() }))
                .collect::<Result<Vec<_>, _>>()
        })?;

        self.merge_context = merge_context.into_inner().unwrap_or_else(|poison| poison.into_inner());

        let mut branches = Vec::with_capacity(worker_results.len());
        for (clone_analyzer, tcs) in worker_results {
            branches.push(clone_analyzer);
            for tc in tcs {
                feed(&mut self.aggregator, tc)?;
            }
        }
        self.analyzer.merge(branches);

        if self.cancelled.load(Ordering::Relaxed) {
            return Err(SchedulerError::Cancelled);
        }
        Ok(())
    }
}

fn feed<Spec: AggregatorSpec>(aggregator: &mut Aggregator<Spec>, tc: Tc<Spec::Contribution>) -> Result<(), SchedulerError> {
    aggregator.add(tc).map_err(aggregator_to_scheduler_error)
}

fn aggregator_to_scheduler_error(_e: AggregatorError) -> SchedulerError {
    // Spill/Collect failures are retried once by the aggregator itself
    // (spec §7); a second failure surfaces as a terminal scheduler error.
    SchedulerError::WorkerPanic {
        segment: "aggregator".to_string(),
    }
}

fn partition_contiguous<'a, 'c>(commits: &'a [&'c dyn Commit], n: usize) -> Vec<&'a [&'c dyn Commit]> {
    let chunk_size = commits.len().div_ceil(n).max(1);
    commits.chunks(chunk_size).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::devs::{DevsAggregatorSpec, DevsAnalyzer};
    use crate::plumbing::repo::InMemoryRepo;
    use chrono::{TimeZone, Utc};
    use history_core::model::Signature;

    struct FakeCommit {
        hash: Hash,
        parents: Vec<Hash>,
        sig: Signature,
    }

    impl Commit for FakeCommit {
        fn hash(&self) -> Hash {
            self.hash
        }
        fn parents(&self) -> &[Hash] {
            &self.parents
        }
        fn author_signature(&self) -> &Signature {
            &self.sig
        }
        fn message(&self) -> &str {
            ""
        }
    }

    fn h(b: u8) -> Hash {
        Hash::from_bytes([b; 20])
    }

    fn commit(id: u8) -> FakeCommit {
        FakeCommit {
            hash: h(id),
            parents: if id == 0 { vec![] } else { vec![h(id - 1)] },
            sig: Signature {
                name: format!("dev{id}"),
                email: format!("dev{id}@example.com"),
                when: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + chrono::Duration::days(id as i64),
            },
        }
    }

    fn new_scheduler(dir: &std::path::Path) -> Scheduler<DevsAnalyzer, DevsAggregatorSpec, InMemoryRepo> {
        let repo = Arc::new(InMemoryRepo::new());
        let analyzer = DevsAnalyzer::new(true, 16);
        let aggregator = analyzer.new_aggregator(history_core::analyzer::AggregatorOptions {
            spill_budget: 1_000_000,
            spill_dir: dir.to_path_buf(),
        });
        Scheduler::new(analyzer, repo, Duration::from_secs(86400), false, aggregator)
    }

    // Testable property #1 (spec §8): Fork(n) + parallel Consume + Merge
    // yields the same TICK sequence as Fork(1), modulo intra-tick order.
    #[test]
    fn fork_merge_associativity_matches_sequential() {
        let commits: Vec<FakeCommit> = (0..12u8).map(commit).collect();
        let refs: Vec<&dyn Commit> = commits.iter().map(|c| c as &dyn Commit).collect();

        let dir_seq = tempfile::tempdir().unwrap();
        let mut seq = new_scheduler(dir_seq.path());
        seq.run_sequential(refs.iter().copied()).unwrap();
        let mut seq_ticks = seq.aggregator_mut().flush_all_ticks().unwrap();

        let dir_par = tempfile::tempdir().unwrap();
        let mut par = new_scheduler(dir_par.path());
        par.run_parallel(&refs, 4).unwrap();
        let mut par_ticks = par.aggregator_mut().flush_all_ticks().unwrap();

        seq_ticks.sort_by_key(|t| t.tick);
        par_ticks.sort_by_key(|t| t.tick);
        assert_eq!(seq_ticks.len(), par_ticks.len());
        for (a, b) in seq_ticks.iter().zip(par_ticks.iter()) {
            assert_eq!(a.tick, b.tick);
            let a_commits: FxHashSet<_> = a.data.as_ref().map(|s| s.by_commit.keys().cloned().collect()).unwrap_or_default();
            let b_commits: FxHashSet<_> = b.data.as_ref().map(|s| s.by_commit.keys().cloned().collect()).unwrap_or_default();
            assert_eq!(a_commits, b_commits);
        }
    }
}
