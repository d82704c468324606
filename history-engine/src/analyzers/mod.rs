//! Concrete [`history_core::analyzer::HistoryAnalyzer`] implementations.

pub mod devs;

pub use devs::{DevCommitRecord, DevTickState, DevsAggregatorSpec, DevsAnalyzer};
