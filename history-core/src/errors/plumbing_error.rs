use super::error_code::{self, HistoryErrorCode};

/// Per-commit failure in the plumbing layer. Callers log and skip the
/// affected commit; the run does not abort (spec §7).
#[derive(Debug, thiserror::Error)]
pub enum PlumbingError {
    #[error("tree diff failed for commit {commit}: {message}")]
    TreeDiff { commit: String, message: String },

    #[error("blob read failed for {hash}: {message}")]
    BlobRead { hash: String, message: String },

    #[error("UAST parse failed for {path}: {message}")]
    UastParse { path: String, message: String },
}

impl HistoryErrorCode for PlumbingError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::TreeDiff { .. } => error_code::PLUMBING_TREE_DIFF,
            Self::BlobRead { .. } => error_code::PLUMBING_BLOB_READ,
            Self::UastParse { .. } => error_code::PLUMBING_UAST_PARSE,
        }
    }
}
