//! `Serialize(format)` over a [`ComputedMetrics`] value (spec §6): `json`,
//! `yaml`, `binary` (= CFB1 envelope over the JSON bytes), and `text`
//! (human terminal summary). `plot` is out of scope.

use history_core::errors::{SerializationError, UnsupportedFormatError};
use history_store::envelope::write_envelope;

use crate::records::ComputedMetrics;

pub fn serialize(metrics: &ComputedMetrics, format: &str) -> Result<Vec<u8>, SerializeError> {
    match format {
        "json" => serde_json::to_vec_pretty(metrics)
            .map_err(|e| SerializationError::Encode { kind: "json".to_string(), message: e.to_string() }.into()),
        "yaml" => serde_yaml::to_string(metrics)
            .map(String::into_bytes)
            .map_err(|e| SerializationError::Encode { kind: "yaml".to_string(), message: e.to_string() }.into()),
        "binary" => {
            let json = serde_json::to_vec(metrics)
                .map_err(|e| SerializationError::Encode { kind: "json".to_string(), message: e.to_string() })?;
            let mut buf = Vec::new();
            write_envelope(&mut buf, &json)
                .map_err(|e| SerializationError::Encode { kind: "binary".to_string(), message: e.to_string() })?;
            Ok(buf)
        }
        "text" => Ok(text_summary(metrics).into_bytes()),
        other => Err(UnsupportedFormatError { format: other.to_string() }.into()),
    }
}

/// Human-terminal rendering: one line per developer and per language,
/// mirroring what an interactive `text` renderer would print.
fn text_summary(metrics: &ComputedMetrics) -> String {
    use std::fmt::Write;

    let mut out = String::new();
    let _ = writeln!(out, "developers: {}", metrics.developers.len());
    for dev in &metrics.developers {
        let _ = writeln!(out, "  {} ({}): {} commits, {} lines", dev.name, dev.author_id, dev.commits, dev.lines.total());
    }
    let _ = writeln!(out, "languages: {}", metrics.languages.len());
    for lang in &metrics.languages {
        let _ = writeln!(out, "  {}: {} lines", lang.language, lang.lines.total());
    }
    for bf in &metrics.bus_factor {
        let _ = writeln!(out, "bus factor [{}]: {} ({:?} risk, primary share {:.1}%)", bf.language, bf.bus_factor, bf.risk, bf.primary_share * 100.0);
    }
    let _ = writeln!(
        out,
        "active developers: {} of {} (threshold tick {})",
        metrics.active_developers.active_author_ids.len(),
        metrics.developers.len(),
        metrics.active_developers.threshold_tick
    );
    let _ = writeln!(out, "estimated total developers: {:.1}", metrics.estimated_total_developers);
    let _ = writeln!(out, "estimated active developers: {:.1}", metrics.estimated_active_developers);
    if let Some(hottest) = metrics.churn.first() {
        let _ = writeln!(out, "hottest file: {} (score {:.2})", hottest.file, hottest.score);
    }
    out
}

/// Either failure mode `Serialize(format)` can surface (spec §7).
#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    #[error(transparent)]
    Serialization(#[from] SerializationError),
    #[error(transparent)]
    UnsupportedFormat(#[from] UnsupportedFormatError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{ActiveDevelopersRecord, BusFactorRecord, RiskLevel};

    fn empty_metrics() -> ComputedMetrics {
        ComputedMetrics {
            developers: Vec::new(),
            languages: Vec::new(),
            bus_factor: vec![BusFactorRecord {
                language: "Rust".to_string(),
                bus_factor: 1,
                primary_share: 1.0,
                risk: RiskLevel::Critical,
            }],
            active_developers: ActiveDevelopersRecord {
                threshold_tick: 0,
                last_tick: 0,
                active_author_ids: Vec::new(),
                fallback_ratio_rule: false,
            },
            churn: Vec::new(),
            estimated_total_developers: 0.0,
            estimated_active_developers: 0.0,
        }
    }

    #[test]
    fn json_round_trips_through_serde_value() {
        let metrics = empty_metrics();
        let bytes = serialize(&metrics, "json").unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["bus_factor"][0]["language"], "Rust");
    }

    #[test]
    fn binary_format_is_a_cfb1_envelope_over_json() {
        let metrics = empty_metrics();
        let bytes = serialize(&metrics, "binary").unwrap();
        assert_eq!(&bytes[0..4], b"CFB1");
    }

    #[test]
    fn unknown_format_is_rejected() {
        let metrics = empty_metrics();
        assert!(serialize(&metrics, "plot").is_err());
    }
}
