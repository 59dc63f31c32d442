// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the three subcommands: `train`, `evaluate` and
// `predict`, and all their configurable flags.
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - error messages for missing args
//   - type conversion (string → usize, f64, enum, etc.)
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};

use crate::application::train_use_case::TrainConfig;
use crate::ml::device::DevicePreference;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the emotion classifier on a feature CSV
    Train(TrainArgs),

    /// Re-evaluate the best checkpoint of a previous training run
    Evaluate(EvaluateArgs),

    /// Predict emotions for the rows of a feature CSV
    Predict(PredictArgs),
}

/// All arguments for the `train` command.
/// Each field becomes a --flag on the command line.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// CSV with numeric feature columns and one label column
    #[arg(long, default_value = "emotion.csv")]
    pub csv_path: String,

    /// Name of the label column; every other column is a feature
    #[arg(long, default_value = "Emotions")]
    pub label_column: String,

    /// Where the normalizer, encoder, checkpoint and reports are written
    #[arg(long, default_value = "artifacts")]
    pub artifact_dir: String,

    #[arg(long, default_value_t = 128)]
    pub batch_size: usize,

    /// Upper bound on epochs; early stopping usually ends sooner
    #[arg(long, default_value_t = 200)]
    pub max_epochs: usize,

    /// Initial Adam learning rate
    #[arg(long, default_value_t = 1.5e-4)]
    pub learning_rate: f64,

    #[arg(long, default_value_t = 1e-5)]
    pub weight_decay: f64,

    /// Share of each class held out for validation
    #[arg(long, default_value_t = 0.2)]
    pub validation_fraction: f64,

    /// Seeds the split, the shuffling and weight initialisation
    #[arg(long, default_value_t = 42)]
    pub random_seed: u64,

    /// Epochs without validation improvement before stopping
    #[arg(long, default_value_t = 10)]
    pub early_stopping_patience: usize,

    /// Multiplier applied to the learning rate on a plateau
    #[arg(long, default_value_t = 0.5)]
    pub lr_decay_factor: f64,

    /// Flat epochs before the learning rate is reduced
    #[arg(long, default_value_t = 3)]
    pub lr_decay_patience: usize,

    #[arg(long, value_enum, default_value_t = DevicePreference::Auto)]
    pub device: DevicePreference,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            csv_path:                a.csv_path,
            label_column:            a.label_column,
            artifact_dir:            a.artifact_dir,
            batch_size:              a.batch_size,
            max_epochs:              a.max_epochs,
            learning_rate:           a.learning_rate,
            weight_decay:            a.weight_decay,
            validation_fraction:     a.validation_fraction,
            random_seed:             a.random_seed,
            early_stopping_patience: a.early_stopping_patience,
            lr_decay_factor:         a.lr_decay_factor,
            lr_decay_patience:       a.lr_decay_patience,
            device:                  a.device,
        }
    }
}

/// All arguments for the `evaluate` command
#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Directory a previous `train` run wrote to
    #[arg(long, default_value = "artifacts")]
    pub artifact_dir: String,

    /// Use this CSV instead of the one recorded at training time
    #[arg(long)]
    pub csv_path: Option<String>,

    #[arg(long, value_enum, default_value_t = DevicePreference::Auto)]
    pub device: DevicePreference,
}

/// All arguments for the `predict` command
#[derive(Args, Debug)]
pub struct PredictArgs {
    /// CSV of feature rows; the label column is optional
    #[arg(long)]
    pub csv_path: String,

    #[arg(long, default_value = "Emotions")]
    pub label_column: String,

    #[arg(long, default_value = "artifacts")]
    pub artifact_dir: String,

    #[arg(long, value_enum, default_value_t = DevicePreference::Auto)]
    pub device: DevicePreference,
}
