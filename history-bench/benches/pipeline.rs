//! Criterion benchmark harness for the history pipeline: plumbing → analyzer
//! consume → aggregation → report store write, at increasing commit-stream
//! sizes. Run with: `cargo bench -p history-bench --bench pipeline`.

use std::sync::Arc;
use std::time::Duration;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use history_bench::fixtures::{generate_fixture, FixtureSize};
use history_bench::report::{BenchmarkRegistry, FixtureInfo};
use history_core::analyzer::{AggregatorOptions, HistoryAnalyzer};
use history_core::model::Commit;
use history_engine::{DevsAnalyzer, PlumbingPipeline, Scheduler};
use history_metrics::{compute_metrics, write_metrics};
use history_store::{ReportWriter, StoreMeta};

const SIZES: &[(FixtureSize, &str)] = &[
    (FixtureSize::Micro, "micro_50commits"),
    (FixtureSize::Small, "small_500commits"),
    (FixtureSize::Medium, "medium_5Kcommits"),
];

fn bench_full_pipeline(c: &mut Criterion) {
    history_core::init_tracing("warn");

    let mut group = c.benchmark_group("full_pipeline");
    group.sample_size(10);
    group.measurement_time(Duration::from_secs(20));

    for &(size, label) in SIZES {
        let fixture = generate_fixture(size, 42);
        let repo = Arc::new(fixture.repo);
        let commits = fixture.commits;

        group.throughput(Throughput::Elements(commits.len() as u64));
        group.bench_with_input(BenchmarkId::new("pipeline", label), &(repo, commits), |b, (repo, commits)| {
            b.iter(|| {
                let refs: Vec<&dyn Commit> = commits.iter().map(|c| c as &dyn Commit).collect();
                run_pipeline(repo.clone(), &refs)
            });
        });
    }

    group.finish();
}

fn bench_plumbing(c: &mut Criterion) {
    let mut group = c.benchmark_group("plumbing");
    group.sample_size(20);

    for &(size, label) in SIZES {
        let fixture = generate_fixture(size, 7);
        let repo = Arc::new(fixture.repo);
        let commits = fixture.commits;
        group.throughput(Throughput::Elements(commits.len() as u64));

        group.bench_with_input(BenchmarkId::new("process", label), &(repo, commits), |b, (repo, commits)| {
            b.iter(|| {
                let mut pipeline = PlumbingPipeline::new(repo.clone(), Duration::from_secs(86_400), false);
                for commit in commits {
                    std::hint::black_box(pipeline.process(commit as &dyn Commit));
                }
            });
        });
    }

    group.finish();
}

fn bench_aggregate_and_store(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate_and_store");
    group.sample_size(10);

    for &(size, label) in SIZES {
        let fixture = generate_fixture(size, 11);
        let repo = Arc::new(fixture.repo);
        let commits = fixture.commits;
        group.throughput(Throughput::Elements(commits.len() as u64));

        group.bench_with_input(BenchmarkId::new("consume_and_write", label), &(repo, commits), |b, (repo, commits)| {
            b.iter(|| {
                let refs: Vec<&dyn Commit> = commits.iter().map(|c| c as &dyn Commit).collect();
                run_pipeline(repo.clone(), &refs)
            });
        });
    }

    group.finish();
}

fn run_pipeline(repo: Arc<history_engine::InMemoryRepo>, commits: &[&dyn Commit]) {
    let spill_dir = tempfile::tempdir().expect("tempdir");
    let store_dir = tempfile::tempdir().expect("tempdir");

    let analyzer = DevsAnalyzer::new(false, 16);
    let aggregator = analyzer.new_aggregator(AggregatorOptions {
        spill_budget: 64 * 1024 * 1024,
        spill_dir: spill_dir.path().to_path_buf(),
    });
    let mut scheduler = Scheduler::new(analyzer, repo, Duration::from_secs(86_400), false, aggregator);

    scheduler.run_sequential(commits.iter().copied()).expect("run_sequential");
    scheduler.finalize_facts();
    let ticks = scheduler.aggregator_mut().flush_all_ticks().expect("flush_all_ticks");
    let report = scheduler.analyzer().ticks_to_report(&ticks);

    let metrics = compute_metrics(&report).expect("compute_metrics");

    let writer = ReportWriter::begin(
        store_dir.path(),
        StoreMeta {
            analyzer_id: "devs".to_string(),
            schema_version: 1,
        },
    )
    .expect("begin");
    write_metrics(&writer, &metrics).expect("write_metrics");
    writer.close().expect("close");
}

fn bench_registry_overhead(c: &mut Criterion) {
    c.bench_function("registry_build_report", |b| {
        b.iter(|| {
            let mut registry = BenchmarkRegistry::new();
            registry.set_fixture(FixtureInfo {
                size_label: "micro".to_string(),
                commit_count: 50,
                total_lines: 1_000,
                total_bytes: 40_000,
                author_count: 12,
            });
            registry.start_phase("plumbing");
            let _ = registry.end_phase(50, 40_000);
            std::hint::black_box(registry.build_report())
        });
    });
}

criterion_group!(benches, bench_full_pipeline, bench_plumbing, bench_aggregate_and_store, bench_registry_overhead);
criterion_main!(benches);
