//! Process configuration (spec §6): `Option<T>` fields with `effective_*()`
//! accessors supplying defaults, so a partially-specified TOML file never
//! surprises a caller with `None`.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

const DEFAULT_TICK_SIZE_HOURS: u64 = 24;
const DEFAULT_HLL_PRECISION: u32 = 14;
const ACTIVE_DEVELOPER_WINDOW_DAYS: u64 = 90;

/// Top-level configuration for one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct HistoryConfig {
    /// Tick duration in seconds. Default: 24h.
    pub tick_size_secs: Option<u64>,
    /// Consider trivial (empty-diff) merge commits. Default: false.
    pub consider_empty_commits: Option<bool>,
    /// Anonymize author identities in reports. Default: false.
    pub anonymize: Option<bool>,
    /// Per-aggregator memory ceiling before spill, in bytes.
    pub spill_budget: Option<u64>,
    pub spill_dir: Option<PathBuf>,
    pub store_dir: Option<PathBuf>,
    pub checkpoint_dir: Option<PathBuf>,
    /// HyperLogLog precision, in `[4, 18]`. Default: 14.
    pub precision: Option<u32>,
}

impl HistoryConfig {
    pub fn effective_tick_size(&self) -> Duration {
        Duration::from_secs(self.tick_size_secs.unwrap_or(DEFAULT_TICK_SIZE_HOURS * 3600))
    }

    pub fn effective_consider_empty_commits(&self) -> bool {
        self.consider_empty_commits.unwrap_or(false)
    }

    pub fn effective_anonymize(&self) -> bool {
        self.anonymize.unwrap_or(false)
    }

    pub fn effective_spill_budget(&self) -> u64 {
        self.spill_budget.unwrap_or(256 * 1024 * 1024)
    }

    pub fn effective_spill_dir(&self) -> PathBuf {
        self.spill_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(".history-miner/spill"))
    }

    pub fn effective_store_dir(&self) -> PathBuf {
        self.store_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(".history-miner/store"))
    }

    pub fn effective_checkpoint_dir(&self) -> PathBuf {
        self.checkpoint_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(".history-miner/checkpoint"))
    }

    pub fn effective_precision(&self) -> u32 {
        self.precision.unwrap_or(DEFAULT_HLL_PRECISION)
    }

    /// Active-developer lookback window, in whole ticks, given the
    /// configured tick size (spec §4.7 "Active developers").
    pub fn active_developer_window_ticks(&self) -> u32 {
        let tick_secs = self.effective_tick_size().as_secs().max(1);
        let window_secs = ACTIVE_DEVELOPER_WINDOW_DAYS * 86_400;
        window_secs.div_ceil(tick_secs) as u32
    }

    /// Validate tick size and HLL precision (spec §7 ConfigError).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_size_secs == Some(0) {
            return Err(ConfigError::BadTickSize {
                secs: 0,
                reason: "tick size must be positive".to_string(),
            });
        }
        let precision = self.effective_precision();
        if !(4..=18).contains(&precision) {
            return Err(ConfigError::BadPrecision { precision });
        }
        Ok(())
    }

    pub fn load_toml(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })
    }
}
