// ============================================================
// Layer 3 — Pipeline Errors
// ============================================================
// Every failure the pipeline can surface to a caller.
//
//   InputNotFound / MalformedInput / MissingLabelColumn
//       data-integrity problems, reported before any epoch runs
//   InsufficientSamples
//       a class too small to stratify, reported before training
//   MissingCheckpoint / MissingArtifact
//       evaluation or prediction without a completed training run
//   WriteFailure
//       an artifact or checkpoint could not be persisted; the
//       previous good file is left in place
//
// A zero-variance feature is NOT an error: the normaliser
// recovers locally by using a scale of 1 and logs a warning.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("malformed input at line {line}: {reason}")]
    MalformedInput { line: usize, reason: String },

    #[error("label column '{0}' not present in input")]
    MissingLabelColumn(String),

    #[error(
        "class {class} has {count} sample(s); cannot stratify with validation fraction {fraction}"
    )]
    InsufficientSamples {
        class:    usize,
        count:    usize,
        fraction: f64,
    },

    #[error("no checkpoint found in '{}'; run `train` first", .0.display())]
    MissingCheckpoint(PathBuf),

    #[error("artifact '{}' not found; run `train` first", .0.display())]
    MissingArtifact(PathBuf),

    #[error("failed to write '{}': {source}", path.display())]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("label '{0}' is not known to the label encoder")]
    UnknownLabel(String),

    #[error("expected {expected} features per row, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
