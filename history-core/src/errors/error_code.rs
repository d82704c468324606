//! Stable string error codes, one constant per failure mode, consumed by
//! callers and tests that need to match on error class without matching on
//! the full enum (teacher's `DriftErrorCode` pattern).

pub trait HistoryErrorCode {
    fn error_code(&self) -> &'static str;
}

pub const BAD_TICK_SIZE: &str = "BAD_TICK_SIZE";
pub const BAD_PRECISION: &str = "BAD_PRECISION";
pub const MISSING_PEOPLE_DICT: &str = "MISSING_PEOPLE_DICT";
pub const CONFIG_PARSE_ERROR: &str = "CONFIG_PARSE_ERROR";

pub const PLUMBING_TREE_DIFF: &str = "PLUMBING_TREE_DIFF";
pub const PLUMBING_BLOB_READ: &str = "PLUMBING_BLOB_READ";
pub const PLUMBING_UAST_PARSE: &str = "PLUMBING_UAST_PARSE";

pub const AGGREGATOR_SPILL: &str = "AGGREGATOR_SPILL";
pub const AGGREGATOR_COLLECT: &str = "AGGREGATOR_COLLECT";

pub const SERIALIZATION_ENCODE: &str = "SERIALIZATION_ENCODE";
pub const SERIALIZATION_DECODE: &str = "SERIALIZATION_DECODE";
pub const UNSUPPORTED_FORMAT: &str = "UNSUPPORTED_FORMAT";
pub const INVALID_REPORT: &str = "INVALID_REPORT";

pub const STORE_IO: &str = "STORE_IO";
pub const STORE_LOCKED: &str = "STORE_LOCKED";

pub const CHECKPOINT_IO: &str = "CHECKPOINT_IO";
pub const CHECKPOINT_CORRUPT: &str = "CHECKPOINT_CORRUPT";

pub const SCHEDULER_CANCELLED: &str = "SCHEDULER_CANCELLED";
pub const SCHEDULER_WORKER_PANIC: &str = "SCHEDULER_WORKER_PANIC";
