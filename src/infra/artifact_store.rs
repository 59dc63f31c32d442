// ============================================================
// Layer 6 — Artifact Store
// ============================================================
// Persists the two preprocessing artifacts a checkpoint depends on:
//
//   scaler.json         — fitted FeatureNormalizer
//                         Refit and overwritten on every training
//                         run; only ever loaded (never refit) by
//                         evaluate and predict.
//
//   label_encoder.json  — ordered class list
//                         Load-if-present: an existing encoder is
//                         reused verbatim so class indices stay
//                         stable across runs; otherwise a new one
//                         is fit and saved immediately.
//
// Both must exist before a checkpoint is usable.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::data::label_encoder::LabelEncoder;
use crate::data::preprocessor::FeatureNormalizer;
use crate::domain::error::PipelineError;
use crate::infra::storage::write_json_atomic;

const SCALER_FILE:  &str = "scaler.json";
const ENCODER_FILE: &str = "label_encoder.json";

pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn scaler_path(&self) -> PathBuf {
        self.dir.join(SCALER_FILE)
    }

    pub fn encoder_path(&self) -> PathBuf {
        self.dir.join(ENCODER_FILE)
    }

    pub fn save_normalizer(&self, normalizer: &FeatureNormalizer) -> Result<(), PipelineError> {
        self.ensure_dir()?;
        write_json_atomic(&self.scaler_path(), normalizer)?;
        tracing::info!("Saved feature normalizer to '{}'", self.scaler_path().display());
        Ok(())
    }

    /// # Errors
    /// `MissingArtifact` if no training run has saved a normalizer yet.
    pub fn load_normalizer(&self) -> Result<FeatureNormalizer> {
        read_json(&self.scaler_path())
    }

    /// Load the persisted encoder, or fit one over `labels` and save it.
    pub fn load_or_fit_encoder<S: AsRef<str>>(&self, labels: &[S]) -> Result<LabelEncoder> {
        if self.encoder_path().exists() {
            tracing::info!("Loading existing label encoder from disk");
            return self.load_encoder();
        }

        let encoder = LabelEncoder::fit(labels);
        self.ensure_dir()?;
        write_json_atomic(&self.encoder_path(), &encoder)?;
        tracing::info!(
            "Label encoder fit with {} classes, saved to '{}'",
            encoder.len(),
            self.encoder_path().display()
        );
        Ok(encoder)
    }

    /// # Errors
    /// `MissingArtifact` if no training run has saved an encoder yet.
    pub fn load_encoder(&self) -> Result<LabelEncoder> {
        read_json(&self.encoder_path())
    }

    fn ensure_dir(&self) -> Result<(), PipelineError> {
        fs::create_dir_all(&self.dir).map_err(|source| PipelineError::WriteFailure {
            path: self.dir.clone(),
            source,
        })
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Err(PipelineError::MissingArtifact(path.to_path_buf()).into());
    }
    let json = fs::read_to_string(path)
        .with_context(|| format!("Cannot read '{}'", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("Corrupt artifact '{}'", path.display()))
}
