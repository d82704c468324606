//! Error kinds the core surfaces to callers (spec §7), one `thiserror` enum
//! per crate boundary plus a top-level [`HistoryError`] that aggregates them
//! for call sites that just want one `Result` type.

pub mod aggregator_error;
pub mod checkpoint_error;
pub mod config_error;
pub mod error_code;
pub mod plumbing_error;
pub mod scheduler_error;
pub mod serialization_error;
pub mod store_error;

pub use aggregator_error::AggregatorError;
pub use checkpoint_error::CheckpointError;
pub use config_error::ConfigError;
pub use error_code::HistoryErrorCode;
pub use plumbing_error::PlumbingError;
pub use scheduler_error::SchedulerError;
pub use serialization_error::{InvalidReportError, SerializationError, UnsupportedFormatError};
pub use store_error::StoreError;

/// Aggregate error type for callers that do not need to distinguish error
/// provenance at the type level.
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Plumbing(#[from] PlumbingError),
    #[error(transparent)]
    Aggregator(#[from] AggregatorError),
    #[error(transparent)]
    Serialization(#[from] SerializationError),
    #[error(transparent)]
    UnsupportedFormat(#[from] UnsupportedFormatError),
    #[error(transparent)]
    InvalidReport(#[from] InvalidReportError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}
