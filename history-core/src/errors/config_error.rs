use super::error_code::{self, HistoryErrorCode};

/// Fatal at initialization (spec §7): invalid tick size, bad precision,
/// missing people dict where required.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid tick size {secs}s: {reason}")]
    BadTickSize { secs: u64, reason: String },

    #[error("HLL precision {precision} out of range [4, 18]")]
    BadPrecision { precision: u32 },

    #[error("people dict required but missing")]
    MissingPeopleDict,

    #[error("failed to parse configuration: {message}")]
    Parse { message: String },
}

impl HistoryErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::BadTickSize { .. } => error_code::BAD_TICK_SIZE,
            Self::BadPrecision { .. } => error_code::BAD_PRECISION,
            Self::MissingPeopleDict => error_code::MISSING_PEOPLE_DICT,
            Self::Parse { .. } => error_code::CONFIG_PARSE_ERROR,
        }
    }
}
