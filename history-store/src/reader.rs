//! Report-store reader (spec §4.6): reads `meta.bin` and streams
//! `<kind>.bin` records back out by decoding `CFB1` envelopes until EOF.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use history_core::errors::StoreError;

use crate::batch::StoreMeta;
use crate::envelope::read_envelope;

fn io_err(analyzer_id: &str, message: impl Into<String>) -> StoreError {
    StoreError::Io {
        analyzer_id: analyzer_id.to_string(),
        message: message.into(),
    }
}

pub struct ReportReader {
    dir: PathBuf,
    meta: StoreMeta,
}

impl ReportReader {
    /// `Open(analyzer_id)`.
    pub fn open(store_dir: impl AsRef<Path>, analyzer_id: &str) -> Result<Self, StoreError> {
        let dir = store_dir.as_ref().join(analyzer_id);
        let mut meta_file = File::open(dir.join("meta.bin")).map_err(|e| io_err(analyzer_id, e.to_string()))?;
        let payload = read_envelope(&mut meta_file)
            .map_err(|e| io_err(analyzer_id, e.to_string()))?
            .ok_or_else(|| io_err(analyzer_id, "meta.bin is empty"))?;
        let meta: StoreMeta =
            bincode::deserialize(&payload).map_err(|e| io_err(analyzer_id, format!("decode meta: {e}")))?;
        Ok(Self { dir, meta })
    }

    pub fn meta(&self) -> &StoreMeta {
        &self.meta
    }

    /// `Kinds()`: every record kind present on disk, discovered from the
    /// directory listing rather than a fixed list so a reader built against
    /// one analyzer version still opens a store written by another.
    pub fn kinds(&self) -> Result<Vec<String>, StoreError> {
        let analyzer_id = &self.meta.analyzer_id;
        let entries = std::fs::read_dir(&self.dir).map_err(|e| io_err(analyzer_id, e.to_string()))?;
        let mut kinds = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| io_err(analyzer_id, e.to_string()))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("bin") {
                continue;
            }
            let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
            if stem == "meta" {
                continue;
            }
            kinds.push(stem.to_string());
        }
        kinds.sort();
        Ok(kinds)
    }

    /// `Iter(kind, fn(raw_bytes) error)`: streams the raw payload of every
    /// record of `kind`, undecoded.
    pub fn iter_raw<F>(&self, kind: &str, mut f: F) -> Result<(), StoreError>
    where
        F: FnMut(&[u8]) -> Result<(), StoreError>,
    {
        let analyzer_id = &self.meta.analyzer_id;
        let file = File::open(self.dir.join(format!("{kind}.bin"))).map_err(|e| io_err(analyzer_id, e.to_string()))?;
        let mut reader = BufReader::new(file);
        while let Some(payload) = read_envelope(&mut reader).map_err(|e| io_err(analyzer_id, e.to_string()))? {
            f(&payload)?;
        }
        Ok(())
    }

    /// Typed convenience over [`iter_raw`] for bincode-encoded records.
    pub fn iter<T, F>(&self, kind: &str, mut f: F) -> Result<(), StoreError>
    where
        T: DeserializeOwned,
        F: FnMut(T) -> Result<(), StoreError>,
    {
        let analyzer_id = self.meta.analyzer_id.clone();
        self.iter_raw(kind, |raw| {
            let record: T = bincode::deserialize(raw).map_err(|e| io_err(&analyzer_id, format!("decode record: {e}")))?;
            f(record)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_fails_cleanly_when_store_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ReportReader::open(dir.path(), "does-not-exist").is_err());
    }
}
