// ============================================================
// Layer 4 — CSV Loader
// ============================================================
// Loads the acoustic feature table produced by the feature
// extraction pipeline.
//
// File layout:
//   - first row is a header
//   - one row per sample
//   - exactly one label column, identified by name
//     (default "Emotions")
//   - every other column is a numeric feature
//
// Cell parsing:
//   - empty cell             → NaN (sanitised to 0.0 later)
//   - "nan", "inf", "-inf"   → parsed as non-finite floats
//   - anything else that is not a number → MalformedInput
//
// Reference: csv crate documentation
//            Rust Book §9 (Error Handling)

use anyhow::Result;
use std::path::PathBuf;

use crate::domain::error::PipelineError;
use crate::domain::sample::RawTable;
use crate::domain::traits::SampleSource;

/// Reads a feature table from a CSV file.
/// Implements the SampleSource trait from Layer 3.
pub struct CsvLoader {
    path:         PathBuf,
    label_column: String,
}

impl CsvLoader {
    pub fn new(path: impl Into<PathBuf>, label_column: impl Into<String>) -> Self {
        Self {
            path:         path.into(),
            label_column: label_column.into(),
        }
    }
}

impl SampleSource for CsvLoader {
    fn load(&self) -> Result<RawTable> {
        // A missing input is fatal and must be reported before anything else runs
        if !self.path.is_file() {
            return Err(PipelineError::InputNotFound(self.path.clone()).into());
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(&self.path)
            .map_err(|e| malformed(1, format!("cannot open CSV: {e}")))?;

        let headers = reader
            .headers()
            .map_err(|e| malformed(1, format!("cannot read header: {e}")))?
            .clone();

        let label_idx = headers.iter().position(|h| h == self.label_column);
        let feature_cols: Vec<usize> = (0..headers.len())
            .filter(|&i| Some(i) != label_idx)
            .collect();

        if feature_cols.is_empty() {
            return Err(malformed(1, "no feature columns in header".to_string()).into());
        }

        let feature_names: Vec<String> = feature_cols
            .iter()
            .map(|&i| headers[i].to_string())
            .collect();

        let mut rows   = Vec::new();
        let mut labels = label_idx.map(|_| Vec::new());

        for (i, record) in reader.records().enumerate() {
            // Header is line 1, so data row i sits on line i + 2
            let line   = i + 2;
            let record = record.map_err(|e| malformed(line, e.to_string()))?;

            let mut row = Vec::with_capacity(feature_cols.len());
            for &col in &feature_cols {
                row.push(parse_cell(&record[col], line, &headers[col])?);
            }
            rows.push(row);

            if let (Some(idx), Some(labels)) = (label_idx, labels.as_mut()) {
                labels.push(record[idx].to_string());
            }
        }

        if rows.is_empty() {
            return Err(malformed(2, "file contains a header but no data rows".to_string()).into());
        }

        tracing::info!(
            "Loaded {} rows x {} features from '{}'{}",
            rows.len(),
            feature_names.len(),
            self.path.display(),
            if labels.is_some() { "" } else { " (no label column)" },
        );

        Ok(RawTable { feature_names, rows, labels })
    }
}

/// Parse one feature cell. Empty cells become NaN, matching how the
/// upstream tables encode missing measurements.
fn parse_cell(raw: &str, line: usize, column: &str) -> Result<f32, PipelineError> {
    if raw.is_empty() {
        return Ok(f32::NAN);
    }
    raw.parse::<f32>()
        .map_err(|_| malformed(line, format!("column '{column}' has non-numeric value '{raw}'")))
}

fn malformed(line: usize, reason: String) -> PipelineError {
    PipelineError::MalformedInput { line, reason }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_csv(dir: &tempfile::TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("emotion.csv");
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_missing_file_is_input_not_found() {
        let loader = CsvLoader::new("/definitely/not/here.csv", "Emotions");
        let err    = loader.load().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::InputNotFound(_))
        ));
    }

    #[test]
    fn test_label_column_is_excluded_from_features() {
        let dir  = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "mfcc1,Emotions,mfcc2\n1.5,happy,2.0\n-0.5,sad,3.0\n");

        let table = CsvLoader::new(path, "Emotions").load().unwrap();
        assert_eq!(table.feature_names, vec!["mfcc1", "mfcc2"]);
        assert_eq!(table.rows, vec![vec![1.5, 2.0], vec![-0.5, 3.0]]);
        assert_eq!(table.labels.unwrap(), vec!["happy", "sad"]);
    }

    #[test]
    fn test_empty_and_non_finite_cells_are_kept_for_sanitising() {
        let dir  = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "a,b,c,Emotions\n,NaN,inf,angry\n");

        let table = CsvLoader::new(path, "Emotions").load().unwrap();
        let row   = &table.rows[0];
        assert!(row[0].is_nan());
        assert!(row[1].is_nan());
        assert!(row[2].is_infinite());
    }

    #[test]
    fn test_non_numeric_cell_is_malformed() {
        let dir  = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "a,Emotions\n1.0,happy\nloud,sad\n");

        let err = CsvLoader::new(path, "Emotions").load().unwrap_err();
        match err.downcast_ref::<PipelineError>() {
            Some(PipelineError::MalformedInput { line, .. }) => assert_eq!(*line, 3),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_label_column_yields_unlabelled_table() {
        let dir  = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "a,b\n1,2\n");

        let table = CsvLoader::new(path, "Emotions").load().unwrap();
        assert!(table.labels.is_none());
        assert_eq!(table.feature_dim(), 2);
    }

    #[test]
    fn test_header_only_file_is_malformed() {
        let dir  = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "a,Emotions\n");

        let err = CsvLoader::new(path, "Emotions").load().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::MalformedInput { .. })
        ));
    }
}
