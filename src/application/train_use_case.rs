// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1:  Load the feature CSV          (Layer 4 - data)
//   Step 2:  Replace NaN / Inf with 0      (Layer 4 - data)
//   Step 3:  Fit the normalizer            (Layer 4 - data)
//   Step 4:  Load or fit the label encoder (Layer 6 - infra)
//   Step 5:  Build the dataset             (Layer 4 - data)
//   Step 6:  Stratified train/val split    (Layer 4 - data)
//   Step 7:  Class weights from train only (Layer 5 - ml)
//   Step 8:  Clear old checkpoint, save
//            scaler + config               (Layer 6 - infra)
//   Step 9:  Run the training controller   (Layer 5 - ml)
//   Step 10: Evaluate the best checkpoint  (Layer 5 - ml)
//
// Every data-integrity error surfaces before the first epoch.
//
// Reference: Rust Book §13 (Iterators and Closures)
//            Burn Book §5 (Training)

use anyhow::{Context, Result};
use burn::tensor::backend::AutodiffBackend;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::data::{
    batcher::BatchSource,
    dataset::EmotionDataset,
    label_encoder::LabelEncoder,
    loader::CsvLoader,
    preprocessor::{sanitize_features, FeatureNormalizer},
    splitter::{stratified_split, Partition},
};
use crate::domain::{error::PipelineError, sample::RawTable, traits::SampleSource};
use crate::infra::{
    artifact_store::ArtifactStore,
    checkpoint::CheckpointManager,
    metrics::MetricsLogger,
    storage::write_json_atomic,
};
use crate::ml::{
    device::DevicePreference,
    evaluator::{EvaluationReport, Evaluator},
    learner::build_learner,
    loss::compute_class_weights,
    trainer::{TrainingController, TrainingSummary},
};

pub const REPORT_FILE: &str = "evaluation_report.json";

// ─── Training Configuration ──────────────────────────────────────────────────
// All settings for a training run, passed by reference to each component.
// Serialisable so it can be saved to disk and reloaded by `evaluate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub csv_path:                String,
    pub label_column:            String,
    pub artifact_dir:            String,
    pub batch_size:              usize,
    pub max_epochs:              usize,
    pub learning_rate:           f64,
    pub weight_decay:            f64,
    pub validation_fraction:     f64,
    pub random_seed:             u64,
    pub early_stopping_patience: usize,
    pub lr_decay_factor:         f64,
    pub lr_decay_patience:       usize,
    pub device:                  DevicePreference,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            csv_path:                "emotion.csv".to_string(),
            label_column:            "Emotions".to_string(),
            artifact_dir:            "artifacts".to_string(),
            batch_size:              128,
            max_epochs:              200,
            learning_rate:           1.5e-4,
            weight_decay:            1e-5,
            validation_fraction:     0.2,
            random_seed:             42,
            early_stopping_patience: 10,
            lr_decay_factor:         0.5,
            lr_decay_patience:       3,
            device:                  DevicePreference::Auto,
        }
    }
}

impl TrainConfig {
    /// Reject settings no run could use.
    pub fn validate(&self) -> Result<(), PipelineError> {
        let invalid = |msg: &str| Err(PipelineError::InvalidConfig(msg.to_string()));

        if self.batch_size == 0 {
            return invalid("batch_size must be positive");
        }
        if self.max_epochs == 0 {
            return invalid("max_epochs must be positive");
        }
        if !(self.learning_rate > 0.0) {
            return invalid("learning_rate must be positive");
        }
        if !(self.weight_decay >= 0.0) {
            return invalid("weight_decay must not be negative");
        }
        if !(self.validation_fraction > 0.0 && self.validation_fraction < 1.0) {
            return invalid("validation_fraction must be between 0 and 1 (exclusive)");
        }
        if self.early_stopping_patience == 0 {
            return invalid("early_stopping_patience must be positive");
        }
        if self.lr_decay_patience == 0 {
            return invalid("lr_decay_patience must be positive");
        }
        if !(self.lr_decay_factor > 0.0 && self.lr_decay_factor < 1.0) {
            return invalid("lr_decay_factor must be between 0 and 1 (exclusive)");
        }
        Ok(())
    }
}

/// Everything a finished training run reports.
#[derive(Debug, Clone, Serialize)]
pub struct TrainOutcome {
    pub summary: TrainingSummary,
    pub report:  EvaluationReport,
}

// ─── Shared preparation ──────────────────────────────────────────────────────
// Used by both train and evaluate so the two see identical samples.

/// Labelled, sanitised table plus its label column.
pub(crate) struct LabelledTable {
    pub table:  RawTable,
    pub labels: Vec<String>,
}

/// Load the CSV, require the label column, replace non-finite values with 0.
pub(crate) fn load_labelled(csv_path: &str, label_column: &str) -> Result<LabelledTable> {
    tracing::info!("Loading features from '{}'", csv_path);
    let mut table = CsvLoader::new(csv_path, label_column).load()?;
    let labels    = table.require_labels(label_column)?.to_vec();

    let replaced = sanitize_features(&mut table.rows);
    if replaced > 0 {
        tracing::warn!("Replaced {} non-finite feature values with 0.0", replaced);
    }
    tracing::info!("Loaded {} samples with {} features", table.num_rows(), table.feature_dim());
    Ok(LabelledTable { table, labels })
}

/// Normalise, encode and wrap the table as a Burn dataset.
pub(crate) fn build_dataset(
    data:       &LabelledTable,
    normalizer: &FeatureNormalizer,
    encoder:    &LabelEncoder,
) -> Result<(EmotionDataset, Vec<usize>)> {
    let rows    = normalizer.transform(&data.table.rows)?;
    let encoded = encoder.encode_all(&data.labels)?;
    Ok((EmotionDataset::from_rows(rows, &encoded), encoded))
}

/// The split every run of the same config reproduces.
pub(crate) fn split(cfg: &TrainConfig, encoded: &[usize]) -> Result<(Partition, Partition)> {
    let (train, val) = stratified_split(encoded, cfg.validation_fraction, cfg.random_seed)?;
    tracing::info!("Split: {} train, {} validation", train.len(), val.len());
    Ok((train, val))
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline end to end on backend `B`.
    pub fn execute<B: AutodiffBackend>(&self, device: B::Device) -> Result<TrainOutcome> {
        let cfg = &self.config;
        cfg.validate()?;

        let artifacts    = ArtifactStore::new(&cfg.artifact_dir);
        let ckpt_manager = CheckpointManager::new(&cfg.artifact_dir);

        // ── Steps 1–2: load + sanitise ────────────────────────────────────────
        let data = load_labelled(&cfg.csv_path, &cfg.label_column)?;

        // ── Step 3: normalizer is refit on every training run ─────────────────
        // Held in memory until every data check below has passed.
        let normalizer = FeatureNormalizer::fit(&data.table.feature_names, &data.table.rows)?;

        // ── Step 4: encoder is reused when one exists ─────────────────────────
        let encoder = artifacts.load_or_fit_encoder(&data.labels)?;

        // ── Step 5: dataset ───────────────────────────────────────────────────
        let (dataset, encoded) = build_dataset(&data, &normalizer, &encoder)?;
        log_class_distribution(&encoder, &encoded);

        // ── Step 6: stratified split ──────────────────────────────────────────
        let (train_part, val_part) = split(cfg, &encoded)?;

        // ── Step 7: class weights from the training partition only ────────────
        let weights = compute_class_weights(&train_part.labels(&encoded), encoder.len());
        tracing::info!("Class weights: {:?}", weights);

        let mut train_src = BatchSource::new(&train_part, cfg.batch_size, true, cfg.random_seed)?;
        let mut val_src   = BatchSource::new(&val_part, cfg.batch_size, false, cfg.random_seed)?;

        // ── Step 8: replace the previous run's artifact set ───────────────────
        // The old checkpoint goes first so it is never paired with the new scaler.
        ckpt_manager.clear()?;
        artifacts.save_normalizer(&normalizer)?;
        ckpt_manager.save_config(cfg)?;

        // ── Step 9: train ─────────────────────────────────────────────────────
        B::seed(cfg.random_seed);
        let mut learner = build_learner::<B>(dataset.feature_dim(), weights, cfg.weight_decay, &device);

        let summary = TrainingController::new(cfg, &ckpt_manager)
            .with_metrics(MetricsLogger::new(&cfg.artifact_dir)?)
            .run(&mut learner, &mut train_src, &mut val_src, &dataset)?;

        // ── Step 10: evaluate what was persisted, not what is in memory ───────
        let report = Evaluator::new(&ckpt_manager, &encoder)
            .evaluate(&mut learner, &mut val_src, &dataset)?;
        save_report(&cfg.artifact_dir, &report)?;

        Ok(TrainOutcome { summary, report })
    }
}

pub(crate) fn save_report(artifact_dir: &str, report: &EvaluationReport) -> Result<()> {
    let path = Path::new(artifact_dir).join(REPORT_FILE);
    write_json_atomic(&path, report)
        .with_context(|| format!("Cannot save evaluation report to '{}'", path.display()))
}

fn log_class_distribution(encoder: &LabelEncoder, encoded: &[usize]) {
    let mut counts = vec![0usize; encoder.len()];
    for &l in encoded {
        counts[l] += 1;
    }
    for (class, count) in encoder.classes().iter().zip(counts) {
        tracing::info!("  {:<12} {:>6} samples", class, count);
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::ml::device::CpuBackend;
    use std::fmt::Write as _;
    use std::fs;

    #[test]
    fn test_default_config_is_valid() {
        assert!(TrainConfig::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_settings_are_rejected() {
        let bad = [
            TrainConfig { batch_size: 0, ..TrainConfig::default() },
            TrainConfig { max_epochs: 0, ..TrainConfig::default() },
            TrainConfig { learning_rate: 0.0, ..TrainConfig::default() },
            TrainConfig { validation_fraction: 1.0, ..TrainConfig::default() },
            TrainConfig { early_stopping_patience: 0, ..TrainConfig::default() },
            TrainConfig { lr_decay_factor: 1.5, ..TrainConfig::default() },
        ];
        for cfg in bad {
            assert!(matches!(cfg.validate(), Err(PipelineError::InvalidConfig(_))));
        }
    }

    #[test]
    fn test_partial_config_json_fills_defaults() {
        let cfg: TrainConfig = serde_json::from_str(r#"{"batch_size": 16}"#).unwrap();
        assert_eq!(cfg.batch_size, 16);
        assert_eq!(cfg.label_column, "Emotions");
    }

    /// Two well separated clusters, 30 rows each, one empty cell.
    pub(crate) fn write_separable_csv(dir: &Path) -> String {
        let mut csv = String::from("f0,f1,f2,Emotions\n");
        for i in 0..30 {
            let x = i as f32 * 0.01;
            writeln!(csv, "{},{},{},calm", -2.0 - x, -1.0, 0.5 + x).unwrap();
            writeln!(csv, "{},{},{},angry", 2.0 + x, 1.0, 0.5 - x).unwrap();
        }
        csv.push_str(",1.0,0.5,angry\n");
        let path = dir.join("emotion.csv");
        fs::write(&path, csv).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_end_to_end_training_on_separable_data() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = TrainConfig {
            csv_path:      write_separable_csv(dir.path()),
            artifact_dir:  dir.path().join("artifacts").to_string_lossy().into_owned(),
            batch_size:    16,
            max_epochs:    40,
            learning_rate: 1e-2,
            device:        DevicePreference::Cpu,
            ..TrainConfig::default()
        };

        let outcome = TrainUseCase::new(cfg.clone())
            .execute::<CpuBackend>(Default::default())
            .unwrap();

        assert!(outcome.summary.best_epoch.is_some());
        assert!(outcome.report.accuracy > 0.9, "accuracy={}", outcome.report.accuracy);
        // 30 calm + 31 angry → 6 + 6 held out
        assert_eq!(outcome.report.samples, 12);

        let art = Path::new(&cfg.artifact_dir);
        for file in ["scaler.json", "label_encoder.json", "best_checkpoint.json",
                     "train_config.json", "metrics.csv", REPORT_FILE] {
            assert!(art.join(file).exists(), "missing {file}");
        }
        let weights: Vec<_> = fs::read_dir(art)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".bin"))
            .collect();
        assert_eq!(weights.len(), 1);
    }

    #[test]
    fn test_missing_label_column_fails_before_training() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("emotion.csv");
        fs::write(&path, "f0,f1\n1,2\n3,4\n").unwrap();

        let cfg = TrainConfig {
            csv_path:     path.to_string_lossy().into_owned(),
            artifact_dir: dir.path().join("artifacts").to_string_lossy().into_owned(),
            ..TrainConfig::default()
        };
        let err = TrainUseCase::new(cfg.clone())
            .execute::<CpuBackend>(Default::default())
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::MissingLabelColumn(_))
        ));
        assert!(!Path::new(&cfg.artifact_dir).join("best_checkpoint.json").exists());
    }

    #[test]
    fn test_failed_run_leaves_previous_artifacts_untouched() {
        let dir          = tempfile::tempdir().unwrap();
        let artifact_dir = dir.path().join("artifacts").to_string_lossy().into_owned();
        let good = TrainConfig {
            csv_path:      write_separable_csv(dir.path()),
            artifact_dir:  artifact_dir.clone(),
            batch_size:    16,
            max_epochs:    3,
            learning_rate: 1e-2,
            ..TrainConfig::default()
        };
        TrainUseCase::new(good).execute::<CpuBackend>(Default::default()).unwrap();

        let art     = Path::new(&artifact_dir);
        let scaler  = fs::read(art.join("scaler.json")).unwrap();
        let pointer = fs::read(art.join("best_checkpoint.json")).unwrap();
        let config  = fs::read(art.join("train_config.json")).unwrap();

        // Different scale and a class with a single sample
        let bad_csv = dir.path().join("bad.csv");
        fs::write(&bad_csv, "f0,f1,f2,Emotions\n100,50,9,calm\n300,70,1,calm\n900,10,4,angry\n").unwrap();
        let bad = TrainConfig {
            csv_path:     bad_csv.to_string_lossy().into_owned(),
            artifact_dir: artifact_dir.clone(),
            ..TrainConfig::default()
        };
        let err = TrainUseCase::new(bad).execute::<CpuBackend>(Default::default()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::InsufficientSamples { .. })
        ));

        assert_eq!(fs::read(art.join("scaler.json")).unwrap(), scaler);
        assert_eq!(fs::read(art.join("best_checkpoint.json")).unwrap(), pointer);
        assert_eq!(fs::read(art.join("train_config.json")).unwrap(), config);
    }

    #[test]
    fn test_singleton_class_fails_before_training() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("emotion.csv");
        fs::write(&path, "f0,Emotions\n1,calm\n2,calm\n3,angry\n").unwrap();

        let cfg = TrainConfig {
            csv_path:     path.to_string_lossy().into_owned(),
            artifact_dir: dir.path().join("artifacts").to_string_lossy().into_owned(),
            ..TrainConfig::default()
        };
        let err = TrainUseCase::new(cfg).execute::<CpuBackend>(Default::default()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::InsufficientSamples { .. })
        ));
    }
}
