//! Generic aggregator: stream coalescer with typed extract/merge/size/build,
//! spilling to disk under a memory budget (spec §4.3).

pub mod aggregator;
pub mod spill_store;

pub use aggregator::{Aggregator, AggregatorSpec, SpillState};
pub use spill_store::SpillStore;
