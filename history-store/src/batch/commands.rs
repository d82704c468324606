//! `Command` enum sent to the report-store writer thread, mirroring the
//! teacher's `BatchCommand` shape but reduced to the report store's two
//! concerns: appending a framed record and flushing.

/// One instruction for the dedicated writer thread.
pub enum Command {
    /// Append one CFB1-framed record to `<kind>.bin`.
    Write { kind: String, payload: Vec<u8> },
    /// Flush and fsync every open kind file, then report completion.
    FlushSync(std::sync::mpsc::SyncSender<Result<(), history_core::errors::StoreError>>),
    /// Stop the writer thread after flushing.
    Shutdown,
}
