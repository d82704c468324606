//! The TC/TICK envelope protocol (spec §3, §4.3) and the untyped `Report`
//! format analyzers hand off to their serializer.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::ids::Hash;
use crate::ids::Tick;

/// Transient contribution: the output of one `Consume` call for one commit.
///
/// `data == None` means "this commit contributed nothing" and must be
/// dropped by the aggregator. `commit_hash` may be [`Hash::NONE`] only for
/// synthetic TCs such as finalization markers.
#[derive(Clone, Debug)]
pub struct Tc<C> {
    pub tick: Tick,
    pub commit_hash: Hash,
    pub data: Option<C>,
}

impl<C> Tc<C> {
    pub fn empty(tick: Tick, commit_hash: Hash) -> Self {
        Self {
            tick,
            commit_hash,
            data: None,
        }
    }

    pub fn with_data(tick: Tick, commit_hash: Hash, data: C) -> Self {
        Self {
            tick,
            commit_hash,
            data: Some(data),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_none()
    }
}

/// Per-tick aggregated payload. One `TickPayload` per (analyzer, tick)
/// reaches the finalizer.
#[derive(Clone, Debug)]
pub struct TickPayload<S> {
    pub tick: Tick,
    pub data: Option<S>,
}

impl<S> TickPayload<S> {
    pub fn empty(tick: Tick) -> Self {
        Self { tick, data: None }
    }

    pub fn with_data(tick: Tick, data: S) -> Self {
        Self {
            tick,
            data: Some(data),
        }
    }
}

/// Untyped value stored in a [`Report`]. Mirrors the dual typed/untyped
/// report problem called out in spec §9 ("Reflective report parsing"): a
/// report value may arrive as a native numeric type or, after a binary
/// round-trip, as a less specific one. [`coerce_i64`] and [`coerce_f64`] are
/// the single coercion points callers should use instead of matching on
/// every numeric variant themselves.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReportValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<ReportValue>),
    Map(HashMap<String, ReportValue>),
}

/// Tolerant `int|float -> i64` coercion (spec §4.7, §9).
pub fn coerce_i64(v: &ReportValue) -> Option<i64> {
    match v {
        ReportValue::Int(i) => Some(*i),
        ReportValue::Float(f) => Some(*f as i64),
        _ => None,
    }
}

/// Tolerant `int|float -> f64` coercion (spec §4.7, §9).
pub fn coerce_f64(v: &ReportValue) -> Option<f64> {
    match v {
        ReportValue::Int(i) => Some(*i as f64),
        ReportValue::Float(f) => Some(*f),
        _ => None,
    }
}

/// The on-the-wire format between a finalized analyzer and its serializer:
/// mapping from string key to untyped value (spec §3).
pub type Report = HashMap<String, ReportValue>;
