#![allow(dead_code)]

//! Concrete plumbing providers, the generic aggregator, the `devs`
//! analyzer, and the fork/merge scheduler that drives them (spec §4).

pub mod aggregate;
pub mod analyzers;
pub mod merge_tracker;
pub mod plumbing;
pub mod schedule;
pub mod sketch;

pub use aggregate::{Aggregator, AggregatorSpec, SpillState, SpillStore};
pub use analyzers::{DevCommitRecord, DevTickState, DevsAggregatorSpec, DevsAnalyzer};
pub use merge_tracker::MergeTracker;
pub use plumbing::repo::{InMemoryRepo, RepoReader};
pub use plumbing::PlumbingPipeline;
pub use schedule::{ChunkPlanner, Scheduler};
pub use sketch::{HyperLogLog, PrecisionMismatch};
