//! Scheduler / fork-merge driver and the chunk-boundary hibernate/boot
//! lifecycle (spec §4.4, §4.5).

pub mod hibernate;
pub mod scheduler;

pub use hibernate::ChunkPlanner;
pub use scheduler::Scheduler;
