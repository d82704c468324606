use super::error_code::{self, HistoryErrorCode};

/// Scheduler-level failure surfaced to the caller of a whole run.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("run was cancelled")]
    Cancelled,

    #[error("worker panicked while processing segment {segment}")]
    WorkerPanic { segment: usize },
}

impl HistoryErrorCode for SchedulerError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Cancelled => error_code::SCHEDULER_CANCELLED,
            Self::WorkerPanic { .. } => error_code::SCHEDULER_WORKER_PANIC,
        }
    }
}
