//! The `devs` analyzer: per-developer, per-language commit and line-stat
//! contributions (spec §4.2 "Consume algorithm (representative: devs)").

use history_core::analyzer::{AggregatorOptions, AnalyzerBase, AnalyzerMode, Descriptor, HistoryAnalyzer, ProcessFacts};
use history_core::ids::AuthorId;
use history_core::model::{Commit, LineStats};
use history_core::plumbing::PlumbingSnapshot;
use history_core::tc::{Report, ReportValue, Tc, TickPayload};
use history_core::types::FxHashMap;

use crate::aggregate::{Aggregator, AggregatorSpec};
use crate::merge_tracker::MergeTracker;

/// One commit's contribution to the `devs` analyzer.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct DevCommitRecord {
    pub author_id: AuthorId,
    pub lines: LineStats,
    pub languages: FxHashMap<String, LineStats>,
    /// Per-file line stats for this commit, feeding the churn-score report
    /// kind (spec §4.7 "Churn score (file history)").
    pub files: FxHashMap<String, LineStats>,
}

/// Per-tick state: commit-hash-hex -> contribution, inserted rather than
/// merged within a tick (spec §4.3, analyzers keyed by commit hash).
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct DevTickState {
    pub by_commit: FxHashMap<String, DevCommitRecord>,
}

pub struct DevsAggregatorSpec;

impl AggregatorSpec for DevsAggregatorSpec {
    type Contribution = DevCommitRecord;
    type State = DevTickState;

    fn extract(&self, by_tick: &mut FxHashMap<history_core::ids::Tick, DevTickState>, tc: Tc<DevCommitRecord>) {
        let Some(record) = tc.data else { return };
        by_tick
            .entry(tc.tick)
            .or_default()
            .by_commit
            .insert(tc.commit_hash.to_string(), record);
    }

    fn merge(mut existing: DevTickState, incoming: DevTickState) -> DevTickState {
        existing.by_commit.extend(incoming.by_commit);
        existing
    }

    fn size(state: &DevTickState) -> u64 {
        // Coarse per-record estimate: one author id, one LineStats triple,
        // and a handful of language buckets.
        state.by_commit.len() as u64 * 128
    }

    fn build(&self, tick: history_core::ids::Tick, state: DevTickState) -> TickPayload<DevTickState> {
        if state.by_commit.is_empty() {
            TickPayload::empty(tick)
        } else {
            TickPayload::with_data(tick, state)
        }
    }
}

/// The `devs` analyzer. Each `Fork`ed clone owns an independent merge
/// tracker seeded for its own (disjoint) commit subset.
pub struct DevsAnalyzer {
    base: AnalyzerBase,
    merge_tracker: MergeTracker,
    consider_empty_commits: bool,
    expected_merges_per_chunk: usize,
}

impl DevsAnalyzer {
    pub fn new(consider_empty_commits: bool, expected_merges_per_chunk: usize) -> Self {
        Self {
            base: AnalyzerBase::default(),
            merge_tracker: MergeTracker::new(expected_merges_per_chunk.max(1), 0.01),
            consider_empty_commits,
            expected_merges_per_chunk,
        }
    }
}

impl HistoryAnalyzer for DevsAnalyzer {
    type Contribution = DevCommitRecord;
    type TickState = DevTickState;
    type Aggregator = Aggregator<DevsAggregatorSpec>;

    fn descriptor(&self) -> Descriptor {
        Descriptor {
            id: "devs",
            mode: AnalyzerMode::PerCommit,
            description: "per-developer, per-language commit and line-stat contributions",
        }
    }

    fn configure(&mut self, facts: &ProcessFacts) {
        self.base.configure(facts);
    }

    fn consume(&mut self, commit: &dyn Commit, snapshot: &PlumbingSnapshot) -> Tc<DevCommitRecord> {
        if commit.is_merge() && self.merge_tracker.seen_or_add(&commit.hash()) {
            tracing::debug!(commit_hash = %commit.hash(), "skipping duplicate merge-commit delivery");
            return Tc::empty(snapshot.tick, commit.hash());
        }
        if snapshot.changes.is_empty() && !self.consider_empty_commits {
            tracing::debug!(commit_hash = %commit.hash(), "skipping empty-diff commit");
            return Tc::empty(snapshot.tick, commit.hash());
        }

        let mut record = DevCommitRecord {
            author_id: snapshot.author,
            lines: LineStats::default(),
            languages: FxHashMap::default(),
            files: FxHashMap::default(),
        };

        if !snapshot.is_merge_context {
            for change in &snapshot.changes {
                let Some(stats) = snapshot.line_stats_for(change) else {
                    continue;
                };
                record.lines += stats;
                let lang = snapshot.language_for(change).to_string();
                *record.languages.entry(lang).or_default() += stats;
                if let Some(path) = change.current_path() {
                    *record.files.entry(path.display().to_string()).or_default() += stats;
                }
            }
        }

        Tc::with_data(snapshot.tick, commit.hash(), record)
    }

    fn fork(&self, n: usize) -> Vec<Self> {
        (0..n)
            .map(|_| DevsAnalyzer {
                base: self.base.clone(),
                merge_tracker: MergeTracker::new(self.expected_merges_per_chunk.max(1), 0.01),
                consider_empty_commits: self.consider_empty_commits,
                expected_merges_per_chunk: self.expected_merges_per_chunk,
            })
            .collect()
    }

    fn merge(&mut self, _branches: Vec<Self>) {
        // Branch contributions are combined by the aggregator's `merge`,
        // not here; `devs` carries no other branch-local state worth
        // folding back into the primary (merge-tracker state is
        // deliberately per-fork and discarded, spec §4.2).
    }

    fn needs_uast(&self) -> bool {
        false
    }

    fn hibernate(&mut self) {
        self.merge_tracker.reset();
    }

    fn boot(&mut self) {
        self.merge_tracker.reset();
    }

    fn new_aggregator(&self, opts: AggregatorOptions) -> Self::Aggregator {
        Aggregator::new(DevsAggregatorSpec, opts.spill_budget, opts.spill_dir)
            .expect("spill directory must be creatable")
    }

    fn ticks_to_report(&self, ticks: &[TickPayload<DevTickState>]) -> Report {
        let mut commit_dev_data = Vec::new();
        let mut commits_by_tick: FxHashMap<String, Vec<ReportValue>> = FxHashMap::default();
        let mut file_totals: FxHashMap<String, (u64, LineStats)> = FxHashMap::default();

        for tick_payload in ticks {
            let Some(state) = &tick_payload.data else { continue };
            let mut hashes = Vec::with_capacity(state.by_commit.len());
            for (hash_hex, record) in &state.by_commit {
                hashes.push(ReportValue::Str(hash_hex.clone()));
                for (path, stats) in &record.files {
                    let entry = file_totals.entry(path.clone()).or_default();
                    entry.0 += 1;
                    entry.1 += *stats;
                }
                commit_dev_data.push(ReportValue::Map(
                    [
                        ("tick".to_string(), ReportValue::Int(tick_payload.tick.get() as i64)),
                        ("commit_hash".to_string(), ReportValue::Str(hash_hex.clone())),
                        ("author_id".to_string(), ReportValue::Int(record.author_id.0 as i64)),
                        ("added".to_string(), ReportValue::Int(record.lines.added as i64)),
                        ("removed".to_string(), ReportValue::Int(record.lines.removed as i64)),
                        ("changed".to_string(), ReportValue::Int(record.lines.changed as i64)),
                        (
                            "languages".to_string(),
                            ReportValue::Map(
                                record
                                    .languages
                                    .iter()
                                    .map(|(lang, stats)| {
                                        (
                                            lang.clone(),
                                            ReportValue::Map(
                                                [
                                                    ("added".to_string(), ReportValue::Int(stats.added as i64)),
                                                    ("removed".to_string(), ReportValue::Int(stats.removed as i64)),
                                                    ("changed".to_string(), ReportValue::Int(stats.changed as i64)),
                                                ]
                                                .into_iter()
                                                .collect(),
                                            ),
                                        )
                                    })
                                    .collect(),
                            ),
                        ),
                    ]
                    .into_iter()
                    .collect(),
                ));
            }
            commits_by_tick.insert(tick_payload.tick.get().to_string(), hashes);
        }

        let people = ReportValue::List(
            self.base
                .facts
                .people
                .iter()
                .map(|(_, name)| ReportValue::Str(name.to_string()))
                .collect(),
        );

        let file_churn_data = file_totals
            .into_iter()
            .map(|(path, (commits, stats))| {
                ReportValue::Map(
                    [
                        ("file".to_string(), ReportValue::Str(path)),
                        ("commits".to_string(), ReportValue::Int(commits as i64)),
                        ("added".to_string(), ReportValue::Int(stats.added as i64)),
                        ("removed".to_string(), ReportValue::Int(stats.removed as i64)),
                        ("changed".to_string(), ReportValue::Int(stats.changed as i64)),
                    ]
                    .into_iter()
                    .collect(),
                )
            })
            .collect();

        [
            ("CommitDevData".to_string(), ReportValue::List(commit_dev_data)),
            (
                "CommitsByTick".to_string(),
                ReportValue::Map(commits_by_tick.into_iter().map(|(k, v)| (k, ReportValue::List(v))).collect()),
            ),
            ("ReversedPeopleDict".to_string(), people),
            (
                "TickSize".to_string(),
                ReportValue::Int(self.base.facts.tick_size.as_secs() as i64),
            ),
            ("FileChurnData".to_string(), ReportValue::List(file_churn_data)),
        ]
        .into_iter()
        .collect()
    }
}

impl Clone for DevsAnalyzer {
    fn clone(&self) -> Self {
        Self {
            base: self.base.clone(),
            merge_tracker: self.merge_tracker.clone(),
            consider_empty_commits: self.consider_empty_commits,
            expected_merges_per_chunk: self.expected_merges_per_chunk,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plumbing::repo::InMemoryRepo;
    use crate::plumbing::PlumbingPipeline;
    use chrono::{TimeZone, Utc};
    use history_core::ids::{Hash, Tick};
    use history_core::model::Signature;
    use std::path::PathBuf;
    use std::sync::Arc;

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

    fn commit(hash: Hash, parents: Vec<Hash>, name: &str) -> FakeCommit {
        FakeCommit {
            hash,
            parents,
            sig: Signature {
                name: name.to_string(),
                email: format!("{name}@example.com"),
                when: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            },
        }
    }

    // Scenario A (spec §8): single developer, single language, one new file.
    #[test]
    fn scenario_a_single_developer_single_language() {
        let mut repo = InMemoryRepo::new();
        repo.put_tree(h(1), vec![(PathBuf::from("a.go"), h(10))]);
        repo.put_blob(h(10), &b"l1\nl2\nl3\nl4\nl5\nl6\nl7\nl8\nl9\nl10\n"[..]);
        let mut pipeline = PlumbingPipeline::new(Arc::new(repo), std::time::Duration::from_secs(86400), false);

        let c = commit(h(1), vec![], "Alice");
        let snapshot = pipeline.process(&c);
        assert_eq!(snapshot.tick, Tick::ZERO);

        let mut analyzer = DevsAnalyzer::new(false, 16);
        let tc = analyzer.consume(&c, &snapshot);
        let record = tc.data.unwrap();
        assert_eq!(record.lines.added, 10);
        assert_eq!(record.languages.get("Go").unwrap().added, 10);
    }

    #[test]
    fn merge_commit_seen_twice_in_one_chunk_yields_one_nonempty_tc() {
        let repo = InMemoryRepo::new();
        let mut pipeline = PlumbingPipeline::new(Arc::new(repo), std::time::Duration::from_secs(86400), false);
        let mut analyzer = DevsAnalyzer::new(true, 16);

        let merge_commit = commit(h(9), vec![h(1), h(2)], "Merger");
        let first = analyzer.consume(&merge_commit, &pipeline.process(&merge_commit));
        let second = analyzer.consume(&merge_commit, &pipeline.process(&merge_commit));
        assert!(first.data.is_some());
        assert!(second.data.is_none());
    }

    #[test]
    fn empty_diff_is_skipped_unless_considering_empty_commits() {
        let repo = InMemoryRepo::new();
        let mut pipeline = PlumbingPipeline::new(Arc::new(repo), std::time::Duration::from_secs(86400), false);
        let mut analyzer = DevsAnalyzer::new(false, 16);
        let c = commit(h(3), vec![h(1)], "Alice");
        let tc = analyzer.consume(&c, &pipeline.process(&c));
        assert!(tc.is_empty());
    }
}
