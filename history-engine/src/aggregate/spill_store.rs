//! Disk-backed segment store for a generic [`super::Aggregator`] (spec §4.3,
//! §4.6 Spill format). Each segment is an immutable sequence of
//! length-prefixed `{key, value}` records; `Collect` streams every segment
//! exactly once, then the segments are deleted.

use std::fs;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use history_core::errors::AggregatorError;

pub struct SpillStore {
    dir: PathBuf,
    segments: Vec<PathBuf>,
    next_id: u64,
}

impl SpillStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, AggregatorError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| AggregatorError::Spill {
            path: dir.display().to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            dir,
            segments: Vec::new(),
            next_id: 0,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Writes one new immutable segment containing `entries`, returning the
    /// approximate number of bytes written.
    pub fn write_segment<I>(&mut self, entries: I) -> Result<u64, AggregatorError>
    where
        I: IntoIterator<Item = (Vec<u8>, Vec<u8>)>,
    {
        let path = self.dir.join(format!("segment-{:020}.bin", self.next_id));
        self.next_id += 1;

        let file = fs::File::create(&path).map_err(|e| spill_err(&path, e))?;
        let mut writer = BufWriter::new(file);
        let mut bytes_written = 0u64;
        for (key, value) in entries {
            bytes_written += write_record(&mut writer, &key, &value).map_err(|e| spill_err(&path, e))?;
        }
        writer.flush().map_err(|e| spill_err(&path, e))?;

        self.segments.push(path);
        Ok(bytes_written)
    }

    /// Streams every segment's records exactly once, deleting each segment
    /// file as it is consumed. On return, the store is empty on disk.
    pub fn drain(&mut self) -> Result<Vec<(Vec<u8>, Vec<u8>)>, AggregatorError> {
        let mut out = Vec::new();
        for path in self.segments.drain(..) {
            out.extend(read_segment(&path).map_err(|e| collect_err(&path, e))?);
            let _ = fs::remove_file(&path);
        }
        Ok(out)
    }

    /// Deletes all segment files without reading them (`DiscardState`).
    pub fn clear(&mut self) -> Result<(), AggregatorError> {
        for path in self.segments.drain(..) {
            fs::remove_file(&path).map_err(|e| spill_err(&path, e))?;
        }
        Ok(())
    }

    /// Re-enumerates `segment-*.bin` files under `dir`, oldest first, after
    /// a checkpoint restore (`RestoreSpillState`). `expected_count` is a
    /// sanity check only; a mismatch does not fail the restore.
    pub fn restore(dir: impl Into<PathBuf>, expected_count: usize) -> Result<Self, AggregatorError> {
        let dir = dir.into();
        let mut segments: Vec<PathBuf> = fs::read_dir(&dir)
            .map_err(|e| AggregatorError::Collect {
                path: dir.display().to_string(),
                message: e.to_string(),
            })?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| n.starts_with("segment-") && n.ends_with(".bin"))
                    .unwrap_or(false)
            })
            .collect();
        segments.sort();

        let next_id = segments.len() as u64;
        if segments.len() != expected_count {
            tracing::warn!(
                dir = %dir.display(),
                found = segments.len(),
                expected = expected_count,
                "spill segment count mismatch on restore"
            );
        }
        Ok(Self {
            dir,
            segments,
            next_id,
        })
    }
}

fn write_record(writer: &mut impl Write, key: &[u8], value: &[u8]) -> std::io::Result<u64> {
    writer.write_all(&(key.len() as u32).to_le_bytes())?;
    writer.write_all(key)?;
    writer.write_all(&(value.len() as u32).to_le_bytes())?;
    writer.write_all(value)?;
    Ok(8 + key.len() as u64 + value.len() as u64)
}

fn read_segment(path: &Path) -> std::io::Result<Vec<(Vec<u8>, Vec<u8>)>> {
    let file = fs::File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut out = Vec::new();
    loop {
        let mut len_buf = [0u8; 4];
        match reader.read_exact(&mut len_buf) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e),
        }
        let key_len = u32::from_le_bytes(len_buf) as usize;
        let mut key = vec![0u8; key_len];
        reader.read_exact(&mut key)?;

        reader.read_exact(&mut len_buf)?;
        let value_len = u32::from_le_bytes(len_buf) as usize;
        let mut value = vec![0u8; value_len];
        reader.read_exact(&mut value)?;

        out.push((key, value));
    }
    Ok(out)
}

fn spill_err(path: &Path, e: std::io::Error) -> AggregatorError {
    AggregatorError::Spill {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}

fn collect_err(path: &Path, e: std::io::Error) -> AggregatorError {
    AggregatorError::Collect {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}
