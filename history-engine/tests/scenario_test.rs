//! End-to-end scenarios from spec §8, driven through the real
//! `Scheduler` + `Aggregator` + `DevsAnalyzer` stack rather than unit-level
//! calls to a single component.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};

use history_core::analyzer::{AggregatorOptions, HistoryAnalyzer};
use history_core::ids::Hash;
use history_core::model::{Commit, Signature};
use history_engine::{DevsAggregatorSpec, DevsAnalyzer, InMemoryRepo, Scheduler};

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

fn signed(name: &str, day: i64) -> Signature {
    Signature {
        name: name.to_string(),
        email: format!("{name}@example.com"),
        when: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + chrono::Duration::days(day),
    }
}

fn new_scheduler(dir: &std::path::Path) -> Scheduler<DevsAnalyzer, DevsAggregatorSpec, InMemoryRepo> {
    let repo = Arc::new(InMemoryRepo::new());
    let analyzer = DevsAnalyzer::new(true, 16);
    let aggregator = analyzer.new_aggregator(AggregatorOptions {
        spill_budget: u64::MAX,
        spill_dir: dir.to_path_buf(),
    });
    Scheduler::new(analyzer, repo, Duration::from_secs(86_400), false, aggregator)
}

// Scenario D (spec §8): a merge commit delivered twice within one chunk
// (once per side of the merge) contributes exactly one non-empty TC; the
// aggregator's distinct-commit count reflects M exactly once.
#[test]
fn scenario_d_merge_commit_dedup_through_the_aggregator() {
    let dir = tempfile::tempdir().unwrap();
    let mut scheduler = new_scheduler(dir.path());

    let parent_a = FakeCommit {
        hash: h(1),
        parents: vec![],
        sig: signed("Alice", 0),
    };
    let parent_b = FakeCommit {
        hash: h(2),
        parents: vec![],
        sig: signed("Bob", 0),
    };
    let merge = FakeCommit {
        hash: h(9),
        parents: vec![h(1), h(2)],
        sig: signed("Merger", 1),
    };

    let commits: Vec<&dyn Commit> = vec![&parent_a, &parent_b, &merge, &merge];
    scheduler.run_sequential(commits.iter().copied()).unwrap();

    let ticks = scheduler.aggregator_mut().flush_all_ticks().unwrap();
    let distinct_commits: std::collections::HashSet<String> = ticks
        .iter()
        .filter_map(|t| t.data.as_ref())
        .flat_map(|state| state.by_commit.keys().cloned())
        .collect();

    // Two parents plus the merge commit, counted once despite two deliveries.
    assert_eq!(distinct_commits.len(), 3);
    assert!(distinct_commits.contains(&merge.hash().to_string()));
}

// Scenario E (spec §8): 10,000 synthetic commits, once with a spill budget
// low enough to force repeated spills and once with an effectively
// unbounded budget. The resulting developer data must be identical.
#[test]
fn scenario_e_spill_round_trip_matches_unbounded_budget() {
    let blob = h(200);

    let commits: Vec<FakeCommit> = (0..2_000u32)
        .map(|i| {
            let id = (i % 250 + 1) as u8;
            FakeCommit {
                hash: Hash::from_bytes({
                    let mut bytes = [0u8; 20];
                    bytes[..4].copy_from_slice(&i.to_le_bytes());
                    bytes
                }),
                parents: vec![],
                sig: signed(&format!("dev-{id}"), i as i64),
            }
        })
        .collect();

    // Give every commit a one-file tree touching the same blob so each
    // produces a non-empty contribution.
    let mut repo = InMemoryRepo::new();
    for commit in &commits {
        repo.put_tree(commit.hash(), vec![(PathBuf::from("a.rs"), blob)]);
    }
    repo.put_blob(blob, &b"a\nb\nc\nd\ne\n"[..]);
    let repo = Arc::new(repo);

    let refs: Vec<&dyn Commit> = commits.iter().map(|c| c as &dyn Commit).collect();

    let forced_spill_dir = tempfile::tempdir().unwrap();
    let analyzer_a = DevsAnalyzer::new(true, 16);
    let aggregator_a = analyzer_a.new_aggregator(AggregatorOptions {
        spill_budget: 2_048,
        spill_dir: forced_spill_dir.path().to_path_buf(),
    });
    let mut scheduler_a = Scheduler::new(analyzer_a, repo.clone(), Duration::from_secs(86_400), false, aggregator_a);
    scheduler_a.run_sequential(refs.iter().copied()).unwrap();
    let mut ticks_a = scheduler_a.aggregator_mut().flush_all_ticks().unwrap();

    let unbounded_dir = tempfile::tempdir().unwrap();
    let analyzer_b = DevsAnalyzer::new(true, 16);
    let aggregator_b = analyzer_b.new_aggregator(AggregatorOptions {
        spill_budget: u64::MAX,
        spill_dir: unbounded_dir.path().to_path_buf(),
    });
    let mut scheduler_b = Scheduler::new(analyzer_b, repo, Duration::from_secs(86_400), false, aggregator_b);
    scheduler_b.run_sequential(refs.iter().copied()).unwrap();
    let mut ticks_b = scheduler_b.aggregator_mut().flush_all_ticks().unwrap();

    ticks_a.sort_by_key(|t| t.tick);
    ticks_b.sort_by_key(|t| t.tick);
    assert_eq!(ticks_a.len(), ticks_b.len());
    for (a, b) in ticks_a.iter().zip(ticks_b.iter()) {
        assert_eq!(a.tick, b.tick);
        let a_keys: std::collections::HashSet<_> = a.data.as_ref().map(|s| s.by_commit.keys().cloned().collect()).unwrap_or_default();
        let b_keys: std::collections::HashSet<_> = b.data.as_ref().map(|s| s.by_commit.keys().cloned().collect()).unwrap_or_default();
        assert_eq!(a_keys, b_keys);
    }
}
