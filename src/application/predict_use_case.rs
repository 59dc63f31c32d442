// ============================================================
// Layer 2 — PredictUseCase
// ============================================================
// Labels the rows of a feature CSV with a trained model.
//
//   Step 1: Load the CSV (label column optional) (Layer 4 - data)
//   Step 2: Rebuild the model from artifacts     (Layer 5 / 6)
//   Step 3: Predict label + confidence per row   (Layer 5 - ml)
//   Step 4: Agreement, when true labels exist
//
// The normalizer saved by training is applied as-is.

use anyhow::Result;
use burn::prelude::Backend;

use crate::data::loader::CsvLoader;
use crate::domain::traits::SampleSource;
use crate::infra::{artifact_store::ArtifactStore, checkpoint::CheckpointManager};
use crate::ml::inferencer::{Inferencer, Prediction};

#[derive(Debug)]
pub struct PredictionReport {
    pub predictions: Vec<Prediction>,
    /// True labels, when the CSV had the label column
    pub truth:       Option<Vec<String>>,
}

impl PredictionReport {
    /// Fraction of rows whose prediction matches the true label.
    pub fn agreement(&self) -> Option<f64> {
        let truth = self.truth.as_ref()?;
        if truth.is_empty() {
            return None;
        }
        let hits = self
            .predictions
            .iter()
            .zip(truth)
            .filter(|(p, t)| &p.label == *t)
            .count();
        Some(hits as f64 / truth.len() as f64)
    }
}

pub struct PredictUseCase {
    artifact_dir: String,
    csv_path:     String,
    label_column: String,
}

impl PredictUseCase {
    pub fn new(
        artifact_dir: impl Into<String>,
        csv_path:     impl Into<String>,
        label_column: impl Into<String>,
    ) -> Self {
        Self {
            artifact_dir: artifact_dir.into(),
            csv_path:     csv_path.into(),
            label_column: label_column.into(),
        }
    }

    pub fn execute<B: Backend>(&self, device: B::Device) -> Result<PredictionReport> {
        let table = CsvLoader::new(&self.csv_path, &self.label_column).load()?;

        let inferencer = Inferencer::<B>::from_artifacts(
            &CheckpointManager::new(&self.artifact_dir),
            &ArtifactStore::new(&self.artifact_dir),
            &device,
        )?;

        let predictions = inferencer.predict(&table.rows)?;
        tracing::info!("Predicted {} rows", predictions.len());

        Ok(PredictionReport { predictions, truth: table.labels })
    }
}
