// ============================================================
// Layer 5 — Inferencer
// ============================================================
// Rebuilds the trained classifier from persisted artifacts and
// labels new feature rows:
//
//   raw row → sanitise (NaN/Inf → 0) → saved normalizer
//           → model → softmax → (label, confidence)
//
// The normalizer is always the one saved by training; it is
// never refit on prediction input.
use anyhow::{anyhow, Result};
use burn::{
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkBytesRecorder, Recorder},
};

use crate::data::label_encoder::LabelEncoder;
use crate::data::preprocessor::{sanitize_features, FeatureNormalizer};
use crate::infra::artifact_store::ArtifactStore;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::evaluator::argmax;
use crate::ml::model::{EmotionClassifier, EmotionClassifierConfig};

/// One labelled row.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub class_index: usize,
    pub label:       String,
    pub confidence:  f32,
}

pub struct Inferencer<B: Backend> {
    model:      EmotionClassifier<B>,
    normalizer: FeatureNormalizer,
    encoder:    LabelEncoder,
    device:     B::Device,
}

impl<B: Backend> Inferencer<B> {
    pub fn from_artifacts(
        ckpt_manager: &CheckpointManager,
        artifacts:    &ArtifactStore,
        device:       &B::Device,
    ) -> Result<Self> {
        let normalizer = artifacts.load_normalizer()?;
        let encoder    = artifacts.load_encoder()?;
        let (meta, weights) = ckpt_manager.load_best()?;

        let model_cfg = EmotionClassifierConfig::new(normalizer.dim(), encoder.len());
        let record = NamedMpkBytesRecorder::<FullPrecisionSettings>::new()
            .load(weights, device)
            .map_err(|e| anyhow!("Cannot load checkpoint weights: {e:?}"))?;
        let model = model_cfg.init::<B>(device).load_record(record);

        tracing::info!("Model loaded from checkpoint (epoch {})", meta.epoch);
        Ok(Self { model, normalizer, encoder, device: device.clone() })
    }

    /// Label every row of a raw (unnormalised) feature matrix.
    pub fn predict(&self, rows: &[Vec<f32>]) -> Result<Vec<Prediction>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let mut rows = rows.to_vec();
        let replaced = sanitize_features(&mut rows);
        if replaced > 0 {
            tracing::warn!("Replaced {} non-finite feature values with 0.0", replaced);
        }
        let rows = self.normalizer.transform(&rows)?;

        let n    = rows.len();
        let dim  = self.normalizer.dim();
        let flat: Vec<f32> = rows.into_iter().flatten().collect();
        let input = Tensor::<B, 1>::from_floats(flat.as_slice(), &self.device).reshape([n, dim]);

        let probs = burn::tensor::activation::softmax(self.model.forward(input), 1);
        let k     = self.encoder.len();
        let probs: Vec<f32> = probs
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| anyhow!("Cannot read probabilities: {e:?}"))?;

        probs
            .chunks(k.max(1))
            .map(|row| {
                let class_index = argmax(row);
                let label = self
                    .encoder
                    .decode(class_index)
                    .ok_or_else(|| anyhow!("class index {class_index} outside the encoder"))?
                    .to_string();
                Ok(Prediction { class_index, label, confidence: row[class_index] })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::PipelineError;

    type TestBackend = burn::backend::NdArray;

    fn persist_model(dir: &std::path::Path) {
        let device = Default::default();
        let names  = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let rows   = vec![vec![0.0, 1.0, 2.0], vec![2.0, 3.0, 4.0]];

        let store = ArtifactStore::new(dir);
        store.save_normalizer(&FeatureNormalizer::fit(&names, &rows).unwrap()).unwrap();
        store.load_or_fit_encoder(&["calm", "fear"]).unwrap();

        let model = EmotionClassifierConfig::new(3, 2).init::<TestBackend>(&device);
        let bytes = NamedMpkBytesRecorder::<FullPrecisionSettings>::new()
            .record(model.clone().into_record(), ())
            .unwrap();
        CheckpointManager::new(dir).save_best(1, 0.5, 1e-4, &bytes).unwrap();
    }

    #[test]
    fn test_predictions_use_encoder_labels_and_softmax_confidence() {
        let dir = tempfile::tempdir().unwrap();
        persist_model(dir.path());

        let inferencer = Inferencer::<TestBackend>::from_artifacts(
            &CheckpointManager::new(dir.path()),
            &ArtifactStore::new(dir.path()),
            &Default::default(),
        )
        .unwrap();

        let preds = inferencer
            .predict(&[vec![1.0, 2.0, 3.0], vec![f32::NAN, 0.0, f32::INFINITY]])
            .unwrap();

        assert_eq!(preds.len(), 2);
        for p in preds {
            assert!(p.label == "calm" || p.label == "fear");
            assert!(p.confidence >= 0.5 && p.confidence <= 1.0);
        }
    }

    #[test]
    fn test_wrong_feature_count_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        persist_model(dir.path());

        let inferencer = Inferencer::<TestBackend>::from_artifacts(
            &CheckpointManager::new(dir.path()),
            &ArtifactStore::new(dir.path()),
            &Default::default(),
        )
        .unwrap();

        let err = inferencer.predict(&[vec![1.0, 2.0]]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::DimensionMismatch { expected: 3, found: 2 })
        ));
    }

    #[test]
    fn test_missing_artifacts_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let result = Inferencer::<TestBackend>::from_artifacts(
            &CheckpointManager::new(dir.path()),
            &ArtifactStore::new(dir.path()),
            &Default::default(),
        );
        assert!(result.is_err());
    }
}
