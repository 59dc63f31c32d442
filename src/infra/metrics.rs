// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records training metrics to a CSV file after each epoch.
//
// Metrics recorded per epoch:
//   - epoch:         the epoch number (1, 2, 3, ...)
//   - train_loss:    mean weighted cross-entropy over training batches
//   - val_loss:      mean weighted cross-entropy over validation batches
//   - learning_rate: LR after this epoch's scheduler step
//   - state:         controller decision (IMPROVED / STALLED / STOPPED)
//
// Output file: artifacts/metrics.csv (rewritten each training run)
//
// Example CSV output:
//   epoch,train_loss,val_loss,learning_rate,state
//   1,1.942310,1.901122,0.00015000,IMPROVED
//   2,1.874561,1.873004,0.00015000,IMPROVED
//   ...
//
// How to read the metrics:
//   - If val_loss rises while train_loss falls → overfitting
//   - Halvings in learning_rate mark validation plateaus
//
// Reference: Rust Book §12 (I/O and File Handling)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

/// One row of metrics data for a single training epoch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// The epoch number (starts at 1)
    pub epoch: usize,

    pub train_loss: f64,

    pub val_loss: f64,

    pub learning_rate: f64,

    /// Controller state after the decision step
    pub state: String,
}

impl EpochMetrics {
    pub fn new(
        epoch:         usize,
        train_loss:    f64,
        val_loss:      f64,
        learning_rate: f64,
        state:         impl Into<String>,
    ) -> Self {
        Self { epoch, train_loss, val_loss, learning_rate, state: state.into() }
    }
}

/// Logs epoch metrics to a CSV file for later analysis.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create the logger, truncating any metrics left by an earlier run.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let csv_path = dir.join("metrics.csv");
        let mut f = fs::File::create(&csv_path)?;
        writeln!(f, "epoch,train_loss,val_loss,learning_rate,state")?;
        tracing::debug!("Created metrics CSV: '{}'", csv_path.display());

        Ok(Self { csv_path })
    }

    /// Append one epoch's metrics as a new row in the CSV.
    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new().append(true).open(&self.csv_path)?;

        writeln!(
            f,
            "{},{:.6},{:.6},{:.8},{}",
            m.epoch, m.train_loss, m.val_loss, m.learning_rate, m.state,
        )?;

        tracing::debug!(
            "Logged epoch {} metrics: train_loss={:.4}, val_loss={:.4}",
            m.epoch,
            m.train_loss,
            m.val_loss,
        );
        Ok(())
    }
}
