//! # history-core
//!
//! Foundation crate for the history-miner analysis engine.
//! Defines the commit/identity/tick data model, the `HistoryAnalyzer`
//! contract, the TC/TICK envelope types, errors, and configuration.
//! Every other crate in the workspace depends on this.

#![allow(dead_code)]

pub mod analyzer;
pub mod config;
pub mod errors;
pub mod ids;
pub mod model;
pub mod plumbing;
pub mod registry;
pub mod tc;
pub mod tracing_setup;
pub mod types;

pub use analyzer::{AggregatorOptions, AnalyzerBase, AnalyzerMode, Descriptor, HistoryAnalyzer, ProcessFacts};
pub use config::HistoryConfig;
pub use errors::HistoryError;
pub use ids::{AuthorId, Hash, Tick};
pub use model::{ChangeAction, ChangeEntry, ChangeKey, Commit, LineStats, ReversedPeopleDict, Signature};
pub use plumbing::PlumbingSnapshot;
pub use tc::{Report, ReportValue, Tc, TickPayload};
pub use tracing_setup::init_tracing;
pub use types::{FxHashMap, FxHashSet};
