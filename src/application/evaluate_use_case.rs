// ============================================================
// Layer 2 — EvaluateUseCase
// ============================================================
// Re-scores the best checkpoint of an earlier `train` run
// without retraining:
//
//   Step 1: Check a checkpoint exists    (Layer 6 - infra)
//   Step 2: Reload train_config.json     (Layer 6 - infra)
//   Step 3: Reload CSV + saved artifacts (Layer 4 / 6)
//   Step 4: Rebuild the same split       (Layer 4 - data)
//   Step 5: Evaluate + save the report   (Layer 5 - ml)
//
// The saved seed and fraction reproduce the validation
// partition of the training run exactly.

use anyhow::Result;
use burn::tensor::backend::AutodiffBackend;

use crate::application::train_use_case::{build_dataset, load_labelled, save_report, split};
use crate::data::batcher::BatchSource;
use crate::domain::error::PipelineError;
use crate::infra::{artifact_store::ArtifactStore, checkpoint::CheckpointManager};
use crate::ml::{
    evaluator::{EvaluationReport, Evaluator},
    learner::build_learner,
    loss::compute_class_weights,
};

pub struct EvaluateUseCase {
    artifact_dir: String,
    /// Read this CSV instead of the one recorded in train_config.json
    csv_override: Option<String>,
}

impl EvaluateUseCase {
    pub fn new(artifact_dir: impl Into<String>, csv_override: Option<String>) -> Self {
        Self { artifact_dir: artifact_dir.into(), csv_override }
    }

    pub fn execute<B: AutodiffBackend>(&self, device: B::Device) -> Result<EvaluationReport> {
        let ckpt_manager = CheckpointManager::new(&self.artifact_dir);
        let artifacts    = ArtifactStore::new(&self.artifact_dir);

        if ckpt_manager.best_meta()?.is_none() {
            return Err(PipelineError::MissingCheckpoint(ckpt_manager.dir().to_path_buf()).into());
        }

        let mut cfg = ckpt_manager.load_config()?;
        if let Some(csv) = &self.csv_override {
            cfg.csv_path = csv.clone();
        }

        let data       = load_labelled(&cfg.csv_path, &cfg.label_column)?;
        let normalizer = artifacts.load_normalizer()?;
        let encoder    = artifacts.load_encoder()?;

        let (dataset, encoded)     = build_dataset(&data, &normalizer, &encoder)?;
        let (train_part, val_part) = split(&cfg, &encoded)?;
        let weights = compute_class_weights(&train_part.labels(&encoded), encoder.len());

        B::seed(cfg.random_seed);
        let mut learner = build_learner::<B>(dataset.feature_dim(), weights, cfg.weight_decay, &device);
        let mut val_src = BatchSource::new(&val_part, cfg.batch_size, false, cfg.random_seed)?;

        let report = Evaluator::new(&ckpt_manager, &encoder)
            .evaluate(&mut learner, &mut val_src, &dataset)?;
        save_report(&self.artifact_dir, &report)?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::train_use_case::{tests::write_separable_csv, TrainConfig, TrainUseCase};
    use crate::ml::device::CpuBackend;

    #[test]
    fn test_evaluation_reproduces_training_report() {
        let dir = tempfile::tempdir().unwrap();
        let artifact_dir = dir.path().join("artifacts").to_string_lossy().into_owned();
        let cfg = TrainConfig {
            csv_path:      write_separable_csv(dir.path()),
            artifact_dir:  artifact_dir.clone(),
            batch_size:    16,
            max_epochs:    5,
            learning_rate: 1e-2,
            ..TrainConfig::default()
        };
        let trained = TrainUseCase::new(cfg).execute::<CpuBackend>(Default::default()).unwrap();

        let use_case = EvaluateUseCase::new(&artifact_dir, None);
        let first    = use_case.execute::<CpuBackend>(Default::default()).unwrap();
        let second   = use_case.execute::<CpuBackend>(Default::default()).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.accuracy, trained.report.accuracy);
        assert_eq!(first.checkpoint_epoch, trained.report.checkpoint_epoch);
    }

    #[test]
    fn test_evaluate_without_training_is_missing_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let err = EvaluateUseCase::new(dir.path().to_string_lossy(), None)
            .execute::<CpuBackend>(Default::default())
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::MissingCheckpoint(_))
        ));
    }
}
