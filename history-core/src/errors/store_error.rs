use super::error_code::{self, HistoryErrorCode};

/// Report-store I/O failure.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error for analyzer {analyzer_id}: {message}")]
    Io {
        analyzer_id: String,
        message: String,
    },

    #[error("store for analyzer {analyzer_id} is locked by another writer")]
    Locked { analyzer_id: String },
}

impl HistoryErrorCode for StoreError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Io { .. } => error_code::STORE_IO,
            Self::Locked { .. } => error_code::STORE_LOCKED,
        }
    }
}
