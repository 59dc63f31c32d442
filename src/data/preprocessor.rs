// ============================================================
// Layer 4 — Feature Preprocessor
// ============================================================
// Cleans and standardises raw acoustic feature rows before they
// reach the model.
//
// Steps (applied in order):
//   1. sanitize_features: every NaN, +Inf and -Inf becomes 0.0.
//      Runs BEFORE fitting.
//   2. FeatureNormalizer::fit: per-column mean and population
//      standard deviation over all rows.
//   3. FeatureNormalizer::transform: (x - mean) / std.
//
// Degenerate (zero-variance) columns:
//   A column whose std is 0 (or not finite) would divide by zero.
//   The normaliser recovers locally by using a scale of 1 for that
//   column, so its normalised value is simply x - mean.
//
// The fitted normaliser is persisted by the ArtifactStore and must
// be reloaded, never refit, for inference.
//
// Reference: Rust Book §8 (Vectors), §13 (Iterators)

use serde::{Deserialize, Serialize};

use crate::domain::error::PipelineError;

/// Replace every non-finite value with 0.0, in place.
/// Returns how many values were replaced.
pub fn sanitize_features(rows: &mut [Vec<f32>]) -> usize {
    let mut replaced = 0usize;
    for value in rows.iter_mut().flat_map(|row| row.iter_mut()) {
        if !value.is_finite() {
            *value = 0.0;
            replaced += 1;
        }
    }
    replaced
}

// ─── FeatureNormalizer ────────────────────────────────────────────────────────
/// Per-feature standardisation statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureNormalizer {
    /// Column names at fit time, kept for traceability in the saved artifact
    pub feature_names: Vec<String>,

    /// Column means
    pub mean: Vec<f64>,

    /// Scale per column; never zero (degenerate columns hold 1.0)
    pub scale: Vec<f64>,
}

impl FeatureNormalizer {
    /// Fit column-wise mean and standard deviation over `rows`.
    ///
    /// Rows are expected to be sanitised already. Fails on an empty
    /// matrix or on rows of unequal length.
    pub fn fit(feature_names: &[String], rows: &[Vec<f32>]) -> Result<Self, PipelineError> {
        let dim = feature_names.len();
        if rows.is_empty() {
            return Err(PipelineError::InvalidConfig(
                "cannot fit a normaliser on zero rows".to_string(),
            ));
        }

        let mut sum = vec![0.0f64; dim];
        for row in rows {
            check_dim(dim, row.len())?;
            for (acc, &x) in sum.iter_mut().zip(row) {
                *acc += x as f64;
            }
        }
        let n    = rows.len() as f64;
        let mean: Vec<f64> = sum.into_iter().map(|s| s / n).collect();

        // Population variance (divide by n), as the standard scaler does
        let mut sq = vec![0.0f64; dim];
        for row in rows {
            for ((acc, &x), m) in sq.iter_mut().zip(row).zip(&mean) {
                let d = x as f64 - m;
                *acc += d * d;
            }
        }

        let mut scale = Vec::with_capacity(dim);
        for (j, s) in sq.into_iter().enumerate() {
            let std = (s / n).sqrt();
            if std > 0.0 && std.is_finite() {
                scale.push(std);
            } else {
                tracing::warn!(
                    "Feature '{}' has zero variance; using scale 1.0",
                    feature_names[j]
                );
                scale.push(1.0);
            }
        }

        Ok(Self {
            feature_names: feature_names.to_vec(),
            mean,
            scale,
        })
    }

    /// Number of features this normaliser was fitted on
    pub fn dim(&self) -> usize {
        self.mean.len()
    }

    /// Standardise a single row.
    pub fn transform_row(&self, row: &[f32]) -> Result<Vec<f32>, PipelineError> {
        check_dim(self.dim(), row.len())?;
        Ok(row
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(&x, (m, s))| ((x as f64 - m) / s) as f32)
            .collect())
    }

    /// Standardise every row.
    pub fn transform(&self, rows: &[Vec<f32>]) -> Result<Vec<Vec<f32>>, PipelineError> {
        rows.iter().map(|row| self.transform_row(row)).collect()
    }
}

fn check_dim(expected: usize, found: usize) -> Result<(), PipelineError> {
    if expected != found {
        return Err(PipelineError::DimensionMismatch { expected, found });
    }
    Ok(())
}
