// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Persists the best model seen so far and the config of the run.
//
// What gets saved:
//   1. model_epoch_{N}.bin   — weights of the best epoch N
//                              (bytes produced by the model's
//                              save_state, Burn's named MessagePack
//                              record for the real classifier)
//   2. best_checkpoint.json  — pointer: which file holds the best
//                              weights, plus its val_loss and LR
//   3. train_config.json     — the TrainConfig of the run, so
//                              `evaluate` can rebuild the same
//                              model and validation partition
//
// Replacement order on a new best epoch:
//   write new weights (atomic) → swap pointer (atomic) →
//   remove the previous weights file
//
// A crash or write error at any step leaves the old pointer
// naming an intact weights file. Only one weights file survives
// a completed save.
//
// File layout:
//   artifacts/
//     model_epoch_17.bin
//     best_checkpoint.json
//     train_config.json
//
// Reference: Burn Book §5 (Records and Checkpointing)
//            Rust Book §9 (Error Handling)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::application::train_use_case::TrainConfig;
use crate::domain::error::PipelineError;
use crate::infra::storage::{write_atomic, write_json_atomic};

const POINTER_FILE: &str = "best_checkpoint.json";
const CONFIG_FILE:  &str = "train_config.json";

/// Contents of `best_checkpoint.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointMeta {
    /// Epoch (1-based) whose weights are stored
    pub epoch: usize,

    /// Mean validation loss of that epoch
    pub val_loss: f64,

    /// Learning rate in effect after that epoch's scheduler step
    pub learning_rate: f64,

    /// Weights file name, relative to the checkpoint directory
    pub file: String,
}

/// Manages saving and loading of the best checkpoint.
/// All files are stored in the configured directory.
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist `state` as the new best checkpoint.
    ///
    /// # Errors
    /// `WriteFailure` if the weights or the pointer cannot be written.
    /// The previous best checkpoint is left untouched in that case.
    pub fn save_best(
        &self,
        epoch:         usize,
        val_loss:      f64,
        learning_rate: f64,
        state:         &[u8],
    ) -> Result<(), PipelineError> {
        self.ensure_dir()?;

        let previous = self.best_meta().ok().flatten();
        let file     = format!("model_epoch_{epoch}.bin");
        let weights  = self.dir.join(&file);

        write_atomic(&weights, state)?;

        let meta = CheckpointMeta { epoch, val_loss, learning_rate, file };
        if let Err(e) = write_json_atomic(&self.pointer_path(), &meta) {
            // The old pointer still names the old weights; drop the orphan
            if previous.as_ref().map(|p| p.file.as_str()) != Some(meta.file.as_str()) {
                let _ = fs::remove_file(&weights);
            }
            return Err(e);
        }

        if let Some(prev) = previous {
            if prev.file != meta.file {
                if let Err(e) = fs::remove_file(self.dir.join(&prev.file)) {
                    tracing::warn!("Could not remove stale checkpoint '{}': {}", prev.file, e);
                }
            }
        }

        tracing::debug!("Saved checkpoint: epoch {} (val_loss={:.6})", epoch, val_loss);
        Ok(())
    }

    /// Read the pointer file. `Ok(None)` when no checkpoint was ever saved.
    pub fn best_meta(&self) -> Result<Option<CheckpointMeta>> {
        let path = self.pointer_path();
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read '{}'", path.display()))?;
        let meta = serde_json::from_str(&json)
            .with_context(|| format!("Corrupt checkpoint pointer '{}'", path.display()))?;
        Ok(Some(meta))
    }

    /// Load the best checkpoint's metadata and weight bytes.
    ///
    /// # Errors
    /// `MissingCheckpoint` if training never saved one.
    pub fn load_best(&self) -> Result<(CheckpointMeta, Vec<u8>)> {
        let meta = self
            .best_meta()?
            .ok_or_else(|| PipelineError::MissingCheckpoint(self.dir.clone()))?;

        let path  = self.dir.join(&meta.file);
        let bytes = fs::read(&path).map_err(|_| PipelineError::MissingCheckpoint(path.clone()))?;

        tracing::info!("Loading checkpoint from epoch {}", meta.epoch);
        Ok((meta, bytes))
    }

    /// Remove every checkpoint left by a previous run.
    pub fn clear(&self) -> Result<()> {
        if !self.dir.is_dir() {
            return Ok(());
        }
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else { continue };
            let stale = name == POINTER_FILE
                || (name.starts_with("model_epoch_")
                    && (name.ends_with(".bin") || name.ends_with(".bin.partial")));
            if stale && path.is_file() {
                fs::remove_file(&path)
                    .with_context(|| format!("Cannot remove '{}'", path.display()))?;
            }
        }
        Ok(())
    }

    /// Save the training configuration to JSON.
    pub fn save_config(&self, cfg: &TrainConfig) -> Result<(), PipelineError> {
        self.ensure_dir()?;
        let path = self.dir.join(CONFIG_FILE);
        write_json_atomic(&path, cfg)?;
        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    /// Load the configuration a previous `train` run saved.
    pub fn load_config(&self) -> Result<TrainConfig> {
        let path = self.dir.join(CONFIG_FILE);
        if !path.exists() {
            return Err(PipelineError::MissingArtifact(path).into());
        }
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read config from '{}'", path.display()))?;
        Ok(serde_json::from_str(&json)?)
    }

    fn pointer_path(&self) -> PathBuf {
        self.dir.join(POINTER_FILE)
    }

    fn ensure_dir(&self) -> Result<(), PipelineError> {
        fs::create_dir_all(&self.dir).map_err(|source| PipelineError::WriteFailure {
            path: self.dir.clone(),
            source,
        })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::storage::partial_path;

    #[test]
    fn test_load_best_without_checkpoint_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = CheckpointManager::new(dir.path().join("none"));

        let err = mgr.load_best().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::MissingCheckpoint(_))
        ));
    }

    #[test]
    fn test_new_best_replaces_previous_weights() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = CheckpointManager::new(dir.path());

        mgr.save_best(2, 0.9, 1e-3, b"epoch two").unwrap();
        mgr.save_best(5, 0.7, 5e-4, b"epoch five").unwrap();

        let (meta, bytes) = mgr.load_best().unwrap();
        assert_eq!(meta.epoch, 5);
        assert_eq!(meta.file, "model_epoch_5.bin");
        assert!((meta.val_loss - 0.7).abs() < 1e-12);
        assert_eq!(bytes, b"epoch five");
        assert!(!dir.path().join("model_epoch_2.bin").exists());
    }

    #[test]
    fn test_failed_save_keeps_previous_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = CheckpointManager::new(dir.path());
        mgr.save_best(3, 0.5, 1e-3, b"good").unwrap();

        fs::create_dir(partial_path(&dir.path().join("model_epoch_4.bin"))).unwrap();
        let err = mgr.save_best(4, 0.4, 1e-3, b"never").unwrap_err();
        assert!(matches!(err, PipelineError::WriteFailure { .. }));

        let (meta, bytes) = mgr.load_best().unwrap();
        assert_eq!(meta.epoch, 3);
        assert_eq!(bytes, b"good");
    }

    #[test]
    fn test_clear_removes_checkpoint_files_only() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = CheckpointManager::new(dir.path());
        mgr.save_best(1, 1.0, 1e-3, b"w").unwrap();
        fs::write(dir.path().join("scaler.json"), "{}").unwrap();

        mgr.clear().unwrap();

        assert!(mgr.best_meta().unwrap().is_none());
        assert!(!dir.path().join("model_epoch_1.bin").exists());
        assert!(dir.path().join("scaler.json").exists());
    }

    #[test]
    fn test_config_round_trip_and_missing() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = CheckpointManager::new(dir.path());
        assert!(mgr.load_config().is_err());

        let cfg = TrainConfig { batch_size: 32, random_seed: 7, ..TrainConfig::default() };
        mgr.save_config(&cfg).unwrap();

        let loaded = mgr.load_config().unwrap();
        assert_eq!(loaded.batch_size, 32);
        assert_eq!(loaded.random_seed, 7);
    }
}
