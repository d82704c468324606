#![allow(dead_code)]

//! The metrics computation facade (spec §4.7): bus factor, active-developer
//! threshold, churn score, and HyperLogLog cardinality estimates, plus the
//! `json`/`yaml`/`binary`/`text` serialization formats for the result
//! (spec §6).

pub mod active;
pub mod bus_factor;
pub mod cardinality;
pub mod churn;
pub mod facade;
pub mod parse;
pub mod records;
pub mod serialize;

pub use facade::{compute_metrics, compute_metrics_from_parsed, read_metrics, write_metrics};
pub use records::{
    ActiveDevelopersRecord, BusFactorRecord, ChurnRecord, ComputedMetrics, DeveloperRecord, LanguageContributor,
    LanguageRecord, RiskLevel,
};
pub use serialize::{serialize, SerializeError};
