use super::error_code::{self, HistoryErrorCode};

/// Report-level failure: fatal for the affected analyzer, other analyzers
/// continue (spec §7).
#[derive(Debug, thiserror::Error)]
pub enum SerializationError {
    #[error("failed to encode {kind}: {message}")]
    Encode { kind: String, message: String },

    #[error("failed to decode {kind}: {message}")]
    Decode { kind: String, message: String },
}

impl HistoryErrorCode for SerializationError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Encode { .. } => error_code::SERIALIZATION_ENCODE,
            Self::Decode { .. } => error_code::SERIALIZATION_DECODE,
        }
    }
}

/// `Serialize(format)` received an unknown format. Fatal for that call.
#[derive(Debug, thiserror::Error)]
#[error("unsupported serialization format: {format}")]
pub struct UnsupportedFormatError {
    pub format: String,
}

impl HistoryErrorCode for UnsupportedFormatError {
    fn error_code(&self) -> &'static str {
        error_code::UNSUPPORTED_FORMAT
    }
}

/// A report lacks required keys (e.g. `ReversedPeopleDict` missing).
/// Callers may retry with a binary-decoded recovery path that re-marshals
/// the untyped report and decodes it into the typed struct (spec §7).
#[derive(Debug, thiserror::Error)]
#[error("report is missing required key(s): {missing_keys:?}")]
pub struct InvalidReportError {
    pub missing_keys: Vec<String>,
}

impl HistoryErrorCode for InvalidReportError {
    fn error_code(&self) -> &'static str {
        error_code::INVALID_REPORT
    }
}
