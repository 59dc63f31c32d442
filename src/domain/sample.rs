// ============================================================
// Layer 3 — Sample Domain Types
// ============================================================
// Two shapes of the same data:
//
//   RawTable — what the loader hands back: feature columns as
//              read from the CSV (may still contain NaN / Inf)
//              and the label strings, if the label column exists.
//
//   Sample   — one encoded, normalised row ready for training:
//              a feature vector and a class index 0..K-1.

use serde::{Deserialize, Serialize};

use crate::domain::error::PipelineError;

/// A feature table as read from the input file, before any cleaning.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    /// Names of the feature columns, in file order (label column excluded)
    pub feature_names: Vec<String>,

    /// One row of raw feature values per sample
    pub rows: Vec<Vec<f32>>,

    /// Label strings, one per row. `None` when the file has no label column,
    /// which is allowed for prediction input but not for training.
    pub labels: Option<Vec<String>>,
}

impl RawTable {
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn feature_dim(&self) -> usize {
        self.feature_names.len()
    }

    /// Borrow the label column, failing if the file did not contain one.
    pub fn require_labels(&self, column: &str) -> Result<&[String], PipelineError> {
        self.labels
            .as_deref()
            .ok_or_else(|| PipelineError::MissingLabelColumn(column.to_string()))
    }
}

/// One encoded training sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Normalised feature vector; every sample in a dataset has the same length
    pub features: Vec<f32>,

    /// Class index assigned by the label encoder
    pub label: usize,
}

impl Sample {
    pub fn new(features: Vec<f32>, label: usize) -> Self {
        Self { features, label }
    }
}
