use super::error_code::{self, HistoryErrorCode};

/// Checkpoint persistence failure.
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    #[error("checkpoint I/O error at {path}: {message}")]
    Io { path: String, message: String },

    #[error("checkpoint at {path} is corrupt: {message}")]
    Corrupt { path: String, message: String },
}

impl HistoryErrorCode for CheckpointError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Io { .. } => error_code::CHECKPOINT_IO,
            Self::Corrupt { .. } => error_code::CHECKPOINT_CORRUPT,
        }
    }
}
