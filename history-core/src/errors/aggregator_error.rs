use super::error_code::{self, HistoryErrorCode};

/// Disk I/O failure during `Spill`/`Collect`. The caller retries once; on a
/// second failure this becomes a terminal error for the scheduler (spec §7).
#[derive(Debug, thiserror::Error)]
pub enum AggregatorError {
    #[error("spill to {path} failed: {message}")]
    Spill { path: String, message: String },

    #[error("collect from {path} failed: {message}")]
    Collect { path: String, message: String },
}

impl HistoryErrorCode for AggregatorError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Spill { .. } => error_code::AGGREGATOR_SPILL,
            Self::Collect { .. } => error_code::AGGREGATOR_COLLECT,
        }
    }
}
