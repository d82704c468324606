//! Checkpoint persister (spec §4.8): periodic JSON serialization of
//! per-analyzer restart state to a restart-safe directory, restored on
//! resume via `RestoreSpillState` on the aggregator and `Reset`/rebuild on
//! the merge tracker.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use history_core::errors::CheckpointError;

/// One analyzer's restart state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Checkpoint {
    pub analyzer_id: String,
    /// Implementation-defined, opaque to the persister.
    pub analyzer_state: Value,
    pub spill_dir: PathBuf,
    pub spill_segment_count: usize,
    #[serde(with = "hex_bytes")]
    pub merge_tracker_bytes: Vec<u8>,
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(d)?;
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}

impl Checkpoint {
    /// `CheckpointSize()`: an estimated byte cost, used by the scheduler to
    /// decide when a checkpoint is worth taking.
    pub fn estimated_size(&self) -> u64 {
        (self.analyzer_state.to_string().len() + self.merge_tracker_bytes.len() + 64) as u64
    }
}

fn io_err(path: &std::path::Path, message: impl Into<String>) -> CheckpointError {
    CheckpointError::Io {
        path: path.display().to_string(),
        message: message.into(),
    }
}

/// Reads and writes one [`Checkpoint`] per analyzer id under
/// `<checkpoint_dir>/<analyzer_id>.json`.
pub struct CheckpointPersister {
    dir: PathBuf,
}

impl CheckpointPersister {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, CheckpointError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| io_err(&dir, e.to_string()))?;
        Ok(Self { dir })
    }

    fn path_for(&self, analyzer_id: &str) -> PathBuf {
        self.dir.join(format!("{analyzer_id}.json"))
    }

    pub fn save(&self, checkpoint: &Checkpoint) -> Result<(), CheckpointError> {
        let path = self.path_for(&checkpoint.analyzer_id);
        let json = serde_json::to_vec_pretty(checkpoint).map_err(|e| io_err(&path, e.to_string()))?;
        fs::write(&path, &json).map_err(|e| io_err(&path, e.to_string()))?;
        tracing::debug!(analyzer_id = %checkpoint.analyzer_id, bytes = json.len(), "checkpoint written");
        Ok(())
    }

    /// Reads the checkpoint for `analyzer_id`, or `None` if this analyzer
    /// has never checkpointed in this directory.
    pub fn load(&self, analyzer_id: &str) -> Result<Option<Checkpoint>, CheckpointError> {
        let path = self.path_for(analyzer_id);
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&path).map_err(|e| io_err(&path, e.to_string()))?;
        let checkpoint = serde_json::from_slice(&bytes).map_err(|e| {
            tracing::warn!(analyzer_id, path = %path.display(), "checkpoint file is corrupt");
            CheckpointError::Corrupt {
                path: path.display().to_string(),
                message: e.to_string(),
            }
        })?;
        Ok(Some(checkpoint))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn round_trips_a_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let persister = CheckpointPersister::new(dir.path()).unwrap();
        let checkpoint = Checkpoint {
            analyzer_id: "devs".to_string(),
            analyzer_state: json!({ "consider_empty_commits": true }),
            spill_dir: PathBuf::from("/tmp/spill/devs"),
            spill_segment_count: 3,
            merge_tracker_bytes: vec![1, 2, 3, 4],
        };
        persister.save(&checkpoint).unwrap();

        let restored = persister.load("devs").unwrap().unwrap();
        assert_eq!(restored.spill_segment_count, 3);
        assert_eq!(restored.merge_tracker_bytes, vec![1, 2, 3, 4]);
    }

    #[test]
    fn load_returns_none_for_an_analyzer_that_never_checkpointed() {
        let dir = tempfile::tempdir().unwrap();
        let persister = CheckpointPersister::new(dir.path()).unwrap();
        assert!(persister.load("ghost").unwrap().is_none());
    }

    #[test]
    fn corrupt_checkpoint_file_is_reported_not_panicked() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("devs.json"), b"not json").unwrap();
        let persister = CheckpointPersister::new(dir.path()).unwrap();
        assert!(persister.load("devs").is_err());
    }
}
