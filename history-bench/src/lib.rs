#![allow(dead_code)]

//! Fixture generation and telemetry reporting shared by the `pipeline`
//! Criterion benchmark and its report tests.

pub mod fixtures;
pub mod report;
