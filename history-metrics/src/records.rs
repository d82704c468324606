//! Stable, typed output of the metrics facade (spec §4.7). Field names are
//! part of the external contract: JSON and YAML serialization must use
//! exactly these names.

use serde::{Deserialize, Serialize};

use history_core::model::LineStats;

/// CHAOSS Contributor Absence Factor risk bucket, derived from the primary
/// contributor's share of a language's total contribution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Critical,
    High,
    Medium,
    Low,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeveloperRecord {
    pub author_id: i32,
    pub name: String,
    pub commits: u64,
    pub lines: LineStats,
    pub languages: std::collections::HashMap<String, LineStats>,
    pub last_active_tick: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LanguageContributor {
    pub author_id: i32,
    pub name: String,
    pub contribution: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LanguageRecord {
    pub language: String,
    pub lines: LineStats,
    pub contributors: Vec<LanguageContributor>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BusFactorRecord {
    pub language: String,
    pub bus_factor: usize,
    pub primary_share: f64,
    pub risk: RiskLevel,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ActiveDevelopersRecord {
    pub threshold_tick: i64,
    pub last_tick: i64,
    pub active_author_ids: Vec<i32>,
    pub fallback_ratio_rule: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChurnRecord {
    pub file: String,
    pub commits: u64,
    pub lines: LineStats,
    pub score: f64,
}

/// The metrics facade's single output, shared across the `json`, `yaml`,
/// `binary`, and `text` serialization formats (spec §6).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ComputedMetrics {
    pub developers: Vec<DeveloperRecord>,
    pub languages: Vec<LanguageRecord>,
    pub bus_factor: Vec<BusFactorRecord>,
    pub active_developers: ActiveDevelopersRecord,
    pub churn: Vec<ChurnRecord>,
    pub estimated_total_developers: f64,
    pub estimated_active_developers: f64,
}
