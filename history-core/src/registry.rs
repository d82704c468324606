//! Process-wide registries (spec §6, §9 "Global mutable state").
//!
//! Both registries below are constructed at init time only — no runtime
//! mutation by user code outside registration — and are protected by a
//! mutex for concurrent reads or test-time swap. Rendering itself (HTML/TUI)
//! is out of scope (spec §1e); the plot-section registry only stores the
//! function pointers a renderer would later call.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, OnceLock};

use crate::ids::Tick;
use crate::tc::Report;

/// Opaque unit of chart/table data a plot renderer would consume. The
/// renderer itself lives outside this core (spec §1e).
#[derive(Clone, Debug)]
pub struct PlotSection {
    pub title: String,
    pub payload: Vec<u8>,
}

pub type PlotSectionFn = fn(&Report) -> Vec<PlotSection>;
pub type AnomalyExtractorFn = fn(&Report) -> (Vec<Tick>, HashMap<String, Vec<f64>>);

fn plot_registry() -> &'static Mutex<HashMap<String, PlotSectionFn>> {
    static REGISTRY: OnceLock<Mutex<HashMap<String, PlotSectionFn>>> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(HashMap::new()))
}

fn anomaly_registry() -> &'static Mutex<HashMap<String, AnomalyExtractorFn>> {
    static REGISTRY: OnceLock<Mutex<HashMap<String, AnomalyExtractorFn>>> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Register a plot-section renderer for `analyzer_id` (spec §6).
pub fn register_plot_sections(analyzer_id: &str, f: PlotSectionFn) {
    plot_registry()
        .lock()
        .expect("plot section registry poisoned")
        .insert(analyzer_id.to_string(), f);
}

/// Look up a previously-registered plot-section renderer.
pub fn plot_sections_for(analyzer_id: &str) -> Option<PlotSectionFn> {
    plot_registry()
        .lock()
        .expect("plot section registry poisoned")
        .get(analyzer_id)
        .copied()
}

/// Register a time-series extractor for cross-analyzer anomaly detection
/// (spec §4.7 "Anomaly extractor registry").
pub fn register_anomaly_extractor(analyzer_id: &str, f: AnomalyExtractorFn) {
    anomaly_registry()
        .lock()
        .expect("anomaly extractor registry poisoned")
        .insert(analyzer_id.to_string(), f);
}

/// Look up a previously-registered extractor.
pub fn anomaly_extractor_for(analyzer_id: &str) -> Option<AnomalyExtractorFn> {
    anomaly_registry()
        .lock()
        .expect("anomaly extractor registry poisoned")
        .get(analyzer_id)
        .copied()
}

/// RAII guard that clears the anomaly extractor registry on acquire and
/// again on drop, while holding the registry's mutex for its entire
/// lifetime. Two tests that each call [`isolated_anomaly_registry`] in
/// their setup are serialized against each other and never observe one
/// another's registrations (spec §8 scenario F).
pub struct AnomalyRegistryTestGuard {
    guard: MutexGuard<'static, HashMap<String, AnomalyExtractorFn>>,
}

impl AnomalyRegistryTestGuard {
    pub fn register(&mut self, analyzer_id: &str, f: AnomalyExtractorFn) {
        self.guard.insert(analyzer_id.to_string(), f);
    }

    pub fn get(&self, analyzer_id: &str) -> Option<AnomalyExtractorFn> {
        self.guard.get(analyzer_id).copied()
    }
}

impl Drop for AnomalyRegistryTestGuard {
    fn drop(&mut self) {
        self.guard.clear();
    }
}

pub fn isolated_anomaly_registry() -> AnomalyRegistryTestGuard {
    let mut guard = anomaly_registry().lock().expect("anomaly extractor registry poisoned");
    guard.clear();
    AnomalyRegistryTestGuard { guard }
}
