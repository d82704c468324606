//! Benchmark telemetry: per-phase timing, derived KPIs, JSON reports, and
//! regression detection against a baseline report.

use std::collections::HashMap;
use std::path::Path;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FixtureInfo {
    pub size_label: String,
    pub commit_count: usize,
    pub total_lines: usize,
    pub total_bytes: usize,
    pub author_count: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PhaseMetric {
    pub name: String,
    pub duration_us: u64,
    pub items_processed: u64,
    pub bytes_processed: u64,
    pub items_per_second: f64,
    pub bytes_per_second: f64,
    pub us_per_item: f64,
    pub sub_metrics: HashMap<String, f64>,
}

impl PhaseMetric {
    pub fn new(name: impl Into<String>, duration: Duration, items_processed: u64, bytes_processed: u64) -> Self {
        let duration_us = duration.as_micros() as u64;
        let secs = duration.as_secs_f64().max(f64::MIN_POSITIVE);
        let items_per_second = items_processed as f64 / secs;
        let bytes_per_second = bytes_processed as f64 / secs;
        let us_per_item = if items_processed == 0 { 0.0 } else { duration_us as f64 / items_processed as f64 };
        Self {
            name: name.into(),
            duration_us,
            items_processed,
            bytes_processed,
            items_per_second,
            bytes_per_second,
            us_per_item,
            sub_metrics: HashMap::new(),
        }
    }

    pub fn with_sub(mut self, name: impl Into<String>, value: f64) -> Self {
        self.sub_metrics.insert(name.into(), value);
        self
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EnvironmentInfo {
    pub os: String,
    pub arch: String,
    pub cpu_count: usize,
    pub profile: String,
}

impl EnvironmentInfo {
    pub fn capture() -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            cpu_count: std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
            profile: if cfg!(debug_assertions) { "debug".to_string() } else { "release".to_string() },
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Kpis {
    pub plumbing_commits_per_second: f64,
    pub aggregate_ticks_per_ms: f64,
    pub store_rows_per_second: f64,
    pub total_duration_us: u64,
    pub phase_ratios: HashMap<String, f64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegressionVerdict {
    pub phase: String,
    pub current_us: u64,
    pub baseline_us: u64,
    pub change_pct: f64,
    pub threshold_pct: f64,
    pub regressed: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub timestamp: String,
    pub commit_sha: Option<String>,
    pub fixture: FixtureInfo,
    pub environment: EnvironmentInfo,
    pub phases: Vec<PhaseMetric>,
    pub kpis: Kpis,
    #[serde(default)]
    pub regressions: Vec<RegressionVerdict>,
}

impl BenchmarkReport {
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).expect("BenchmarkReport always serializes")
    }

    pub fn to_json_compact(&self) -> String {
        serde_json::to_string(self).expect("BenchmarkReport always serializes")
    }

    pub fn write_to_file(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        std::fs::write(path, self.to_json())
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        serde_json::from_slice(&bytes).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    pub fn has_regressions(&self) -> bool {
        self.regressions.iter().any(|r| r.regressed)
    }

    pub fn summary(&self) -> String {
        let mut out = String::new();
        out.push_str("=== HISTORY PIPELINE BENCHMARK REPORT ===\n");
        for phase in &self.phases {
            out.push_str(&format!(
                "{:<12} {:>10.2} us/item  {:>10.1} items/s\n",
                phase.name, phase.us_per_item, phase.items_per_second
            ));
        }
        out.push_str(&format!("plumbing commits/s: {:.1}\n", self.kpis.plumbing_commits_per_second));
        out.push_str(&format!("aggregate ticks/ms: {:.2}\n", self.kpis.aggregate_ticks_per_ms));
        out.push_str(&format!("store rows/s: {:.1}\n", self.kpis.store_rows_per_second));
        for verdict in &self.regressions {
            if verdict.regressed {
                out.push_str(&format!("REGRESSED: {} ({:+.1}% vs baseline)\n", verdict.phase, verdict.change_pct));
            }
        }
        out
    }
}

/// Accumulates phase timings across one benchmark run and produces a
/// [`BenchmarkReport`].
#[derive(Default)]
pub struct BenchmarkRegistry {
    phases: Vec<PhaseMetric>,
    fixture: FixtureInfo,
    commit_sha: Option<String>,
    in_flight: Option<(String, Instant)>,
}

impl BenchmarkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fixture(&mut self, fixture: FixtureInfo) {
        self.fixture = fixture;
    }

    pub fn set_commit_sha(&mut self, sha: impl Into<String>) {
        self.commit_sha = Some(sha.into());
    }

    pub fn start_phase(&mut self, name: impl Into<String>) {
        self.in_flight = Some((name.into(), Instant::now()));
    }

    pub fn end_phase(&mut self, items_processed: u64, bytes_processed: u64) -> Option<PhaseMetric> {
        let (name, started) = self.in_flight.take()?;
        let metric = PhaseMetric::new(name, started.elapsed(), items_processed, bytes_processed);
        self.phases.push(metric.clone());
        Some(metric)
    }

    pub fn record_phase(&mut self, metric: PhaseMetric) {
        self.phases.push(metric);
    }

    pub fn phases(&self) -> &[PhaseMetric] {
        &self.phases
    }

    pub fn phase(&self, name: &str) -> Option<&PhaseMetric> {
        self.phases.iter().find(|p| p.name == name)
    }

    fn compute_kpis(&self) -> Kpis {
        let total_duration_us = self.phases.iter().map(|p| p.duration_us).sum();
        let plumbing_commits_per_second = self.phase("plumbing").map(|p| p.items_per_second).unwrap_or(0.0);
        let aggregate_ticks_per_ms = self
            .phase("aggregate")
            .and_then(|p| p.sub_metrics.get("ticks_per_ms"))
            .copied()
            .unwrap_or(0.0);
        let store_rows_per_second = self.phase("store").map(|p| p.items_per_second).unwrap_or(0.0);

        let mut phase_ratios = HashMap::new();
        const ADJACENT: &[(&str, &str)] = &[("consume", "plumbing"), ("aggregate", "consume"), ("store", "aggregate")];
        for (num, den) in ADJACENT {
            if let (Some(n), Some(d)) = (self.phase(num), self.phase(den)) {
                if d.duration_us > 0 {
                    phase_ratios.insert(format!("{num}/{den}"), n.duration_us as f64 / d.duration_us as f64);
                }
            }
        }

        Kpis {
            plumbing_commits_per_second,
            aggregate_ticks_per_ms,
            store_rows_per_second,
            total_duration_us,
            phase_ratios,
        }
    }

    pub fn build_report(&self) -> BenchmarkReport {
        BenchmarkReport {
            timestamp: timestamp_now(),
            commit_sha: self.commit_sha.clone(),
            fixture: self.fixture.clone(),
            environment: EnvironmentInfo::capture(),
            phases: self.phases.clone(),
            kpis: self.compute_kpis(),
            regressions: Vec::new(),
        }
    }

    /// Compares this registry's phases against `baseline`'s, flagging any
    /// phase whose duration grew by more than `threshold_pct`.
    pub fn compare_to_baseline(&self, baseline: &BenchmarkReport, threshold_pct: f64) -> Vec<RegressionVerdict> {
        let mut verdicts = Vec::new();
        for phase in &self.phases {
            let Some(base) = baseline.phases.iter().find(|p| p.name == phase.name) else {
                continue;
            };
            if base.duration_us == 0 {
                continue;
            }
            let change_pct = (phase.duration_us as f64 - base.duration_us as f64) / base.duration_us as f64 * 100.0;
            verdicts.push(RegressionVerdict {
                phase: phase.name.clone(),
                current_us: phase.duration_us,
                baseline_us: base.duration_us,
                change_pct,
                threshold_pct,
                regressed: change_pct > threshold_pct,
            });
        }
        verdicts
    }
}

/// `YYYY-MM-DDTHH:MM:SSZ`, built from the system clock without pulling in a
/// `Date.now()`-shaped dependency the benchmark harness doesn't otherwise need.
fn timestamp_now() -> String {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    let dt = chrono::DateTime::<chrono::Utc>::from(std::time::UNIX_EPOCH + now);
    dt.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}
