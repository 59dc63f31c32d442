// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The seams between the pipeline and its collaborators:
//   - SampleSource   → where raw tables come from (CsvLoader)
//   - TrainableModel → the black-box numeric engine the
//                      training controller and evaluator drive
//                      (ClassifierLearner over Burn, or a scripted
//                      model in tests)
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;

use crate::domain::sample::{RawTable, Sample};

// ─── SampleSource ─────────────────────────────────────────────────────────────
/// Any component that can produce a raw feature table.
pub trait SampleSource {
    /// Load the full table. Fails with `PipelineError::InputNotFound`
    /// when the underlying resource does not exist.
    fn load(&self) -> Result<RawTable>;
}

// ─── TrainableModel ───────────────────────────────────────────────────────────
/// A trainable classifier as seen by the training controller.
///
/// One call to [`train_step`](TrainableModel::train_step) is the full
/// forward → weighted loss → backward → optimiser step sequence for a
/// single batch. It completes synchronously before returning.
pub trait TrainableModel {
    /// Run one optimisation step on `batch` at `learning_rate`.
    /// Returns the weighted batch loss.
    fn train_step(&mut self, batch: &[Sample], learning_rate: f64) -> Result<f64>;

    /// Weighted loss on `batch` with no gradient tracking and no update.
    fn validation_loss(&self, batch: &[Sample]) -> Result<f64>;

    /// Class scores for every sample in `batch`, one row of K logits per sample.
    fn logits(&self, batch: &[Sample]) -> Result<Vec<Vec<f32>>>;

    /// Serialise every trainable parameter.
    fn save_state(&self) -> Result<Vec<u8>>;

    /// Replace every trainable parameter with a snapshot from `save_state`.
    fn load_state(&mut self, state: Vec<u8>) -> Result<()>;
}
