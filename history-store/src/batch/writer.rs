//! Report-store writer (spec §4.6): one directory per analyzer id, one
//! append-only file per record kind, each record framed in a `CFB1`
//! envelope. A dedicated writer thread fed through a bounded channel does
//! the actual I/O, adapted to plain files with no transaction to batch.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender};
use serde::{Deserialize, Serialize};

use history_core::errors::StoreError;

use crate::envelope::write_envelope;
use super::commands::Command;

const CHANNEL_BOUND: usize = 1024;

/// Opaque analyzer-identity + schema-version envelope written to
/// `meta.bin`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoreMeta {
    pub analyzer_id: String,
    pub schema_version: u32,
}

fn io_err(analyzer_id: &str, message: impl Into<String>) -> StoreError {
    StoreError::Io {
        analyzer_id: analyzer_id.to_string(),
        message: message.into(),
    }
}

/// Writes one analyzer's finalized, kind-keyed records under
/// `<store_dir>/<analyzer_id>/`.
pub struct ReportWriter {
    tx: Sender<Command>,
    handle: Option<JoinHandle<Result<(), StoreError>>>,
    analyzer_id: String,
}

impl ReportWriter {
    /// `Begin(analyzer_id, meta)`: creates the analyzer directory, writes
    /// `meta.bin` synchronously, and starts the writer thread. Holds an
    /// exclusive lock on `<dir>/.lock` for the writer's lifetime so two
    /// writers for the same analyzer id cannot interleave (spec §5).
    pub fn begin(store_dir: impl AsRef<Path>, meta: StoreMeta) -> Result<Self, StoreError> {
        let dir = store_dir.as_ref().join(&meta.analyzer_id);
        fs::create_dir_all(&dir).map_err(|e| io_err(&meta.analyzer_id, e.to_string()))?;

        let payload = bincode::serialize(&meta)
            .map_err(|e| io_err(&meta.analyzer_id, format!("encode meta: {e}")))?;
        let mut meta_file = File::create(dir.join("meta.bin"))
            .map_err(|e| io_err(&meta.analyzer_id, e.to_string()))?;
        write_envelope(&mut meta_file, &payload).map_err(|e| io_err(&meta.analyzer_id, e.to_string()))?;
        meta_file.sync_all().map_err(|e| io_err(&meta.analyzer_id, e.to_string()))?;

        let lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .open(dir.join(".lock"))
            .map_err(|e| io_err(&meta.analyzer_id, e.to_string()))?;

        let (tx, rx) = bounded(CHANNEL_BOUND);
        let worker_dir = dir.clone();
        let analyzer_id = meta.analyzer_id.clone();
        let handle = thread::Builder::new()
            .name(format!("history-store-writer-{analyzer_id}"))
            .spawn(move || writer_loop(worker_dir, analyzer_id, lock_file, rx))
            .expect("failed to spawn report-store writer thread");

        Ok(Self {
            tx,
            handle: Some(handle),
            analyzer_id: meta.analyzer_id,
        })
    }

    /// `ReportWriter.Write(kind, record)`.
    pub fn write<T: Serialize>(&self, kind: &str, record: &T) -> Result<(), StoreError> {
        let payload =
            bincode::serialize(record).map_err(|e| io_err(&self.analyzer_id, format!("encode {kind}: {e}")))?;
        self.tx
            .send(Command::Write {
                kind: kind.to_string(),
                payload,
            })
            .map_err(|_| io_err(&self.analyzer_id, "writer thread disconnected"))
    }

    /// `ReportWriter.Close()`: flushes and fsyncs every open kind file,
    /// releases the lock, and joins the writer thread.
    pub fn close(mut self) -> Result<(), StoreError> {
        self.shutdown_and_join()
    }

    fn shutdown_and_join(&mut self) -> Result<(), StoreError> {
        let (done_tx, done_rx) = std::sync::mpsc::sync_channel(0);
        let flush_result = if self.tx.send(Command::FlushSync(done_tx)).is_ok() {
            done_rx.recv().unwrap_or(Ok(()))
        } else {
            Ok(())
        };
        let _ = self.tx.send(Command::Shutdown);
        if let Some(handle) = self.handle.take() {
            match handle.join() {
                Ok(result) => result?,
                Err(_) => return Err(io_err(&self.analyzer_id, "writer thread panicked")),
            }
        }
        flush_result
    }
}

impl Drop for ReportWriter {
    fn drop(&mut self) {
        if self.handle.is_some() {
            if let Err(err) = self.shutdown_and_join() {
                tracing::warn!(analyzer_id = %self.analyzer_id, %err, "report writer close on drop failed");
            }
        }
    }
}

fn writer_loop(
    dir: PathBuf,
    analyzer_id: String,
    lock_file: File,
    rx: Receiver<Command>,
) -> Result<(), StoreError> {
    let mut lock = fd_lock::RwLock::new(lock_file);
    let _guard = lock
        .try_write()
        .map_err(|e| io_err(&analyzer_id, format!("lock held by another writer: {e}")))?;

    let mut files: HashMap<String, BufWriter<File>> = HashMap::new();

    for command in rx.iter() {
        match command {
            Command::Write { kind, payload } => {
                let file = open_or_get(&dir, &analyzer_id, &mut files, &kind)?;
                write_envelope(&mut *file, &payload).map_err(|e| io_err(&analyzer_id, e.to_string()))?;
            }
            Command::FlushSync(done_tx) => {
                let result = flush_all(&mut files, &analyzer_id);
                let _ = done_tx.send(result);
            }
            Command::Shutdown => break,
        }
    }
    flush_all(&mut files, &analyzer_id)
}

fn open_or_get<'a>(
    dir: &Path,
    analyzer_id: &str,
    files: &'a mut HashMap<String, BufWriter<File>>,
    kind: &str,
) -> Result<&'a mut BufWriter<File>, StoreError> {
    if !files.contains_key(kind) {
        let path = dir.join(format!("{kind}.bin"));
        let f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| io_err(analyzer_id, e.to_string()))?;
        files.insert(kind.to_string(), BufWriter::new(f));
    }
    Ok(files.get_mut(kind).unwrap())
}

fn flush_all(files: &mut HashMap<String, BufWriter<File>>, analyzer_id: &str) -> Result<(), StoreError> {
    for file in files.values_mut() {
        file.flush().map_err(|e| io_err(analyzer_id, e.to_string()))?;
        file.get_ref().sync_all().map_err(|e| io_err(analyzer_id, e.to_string()))?;
    }
    Ok(())
}
