// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Three commands are supported:
//   1. `train`    — trains the classifier on a feature CSV
//   2. `evaluate` — reports on the best checkpoint again
//   3. `predict`  — labels new rows with the trained model
//
// The device flag is resolved once here and picks the Burn
// backend type every later layer is instantiated with.
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, EvaluateArgs, PredictArgs, TrainArgs};

use crate::application::{
    evaluate_use_case::EvaluateUseCase,
    predict_use_case::PredictUseCase,
    train_use_case::{TrainConfig, TrainUseCase},
};
use crate::ml::device::{Accelerator, CpuBackend, CpuInference};
#[cfg(feature = "wgpu")]
use crate::ml::device::{GpuBackend, GpuInference};

#[derive(Parser, Debug)]
#[command(
    name = "voice-emotion-trainer",
    version = "0.1.0",
    about = "Train a feed-forward emotion classifier on acoustic features, then evaluate and predict."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)    => run_train(args),
            Commands::Evaluate(args) => run_evaluate(args),
            Commands::Predict(args)  => run_predict(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    let config: TrainConfig = args.into();
    config.validate()?;
    let accel = config.device.resolve()?;

    tracing::info!("Starting training on '{}'", config.csv_path);
    let use_case = TrainUseCase::new(config);
    let outcome = match accel {
        Accelerator::Cpu => use_case.execute::<CpuBackend>(Default::default())?,
        #[cfg(feature = "wgpu")]
        Accelerator::Gpu => use_case.execute::<GpuBackend>(Default::default())?,
    };

    let summary = &outcome.summary;
    println!(
        "\nTraining finished after {} epochs{} (best epoch: {}, val_loss={:.4}, final lr={:.2e})",
        summary.epochs_run,
        if summary.stopped_early { " (early stop)" } else { "" },
        summary.best_epoch.map_or_else(|| "-".to_string(), |e| e.to_string()),
        summary.best_val_loss,
        summary.final_lr,
    );
    println!("\n{}", outcome.report);
    Ok(())
}

fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    let accel    = args.device.resolve()?;
    let use_case = EvaluateUseCase::new(args.artifact_dir, args.csv_path);

    let report = match accel {
        Accelerator::Cpu => use_case.execute::<CpuBackend>(Default::default())?,
        #[cfg(feature = "wgpu")]
        Accelerator::Gpu => use_case.execute::<GpuBackend>(Default::default())?,
    };
    println!("{report}");
    Ok(())
}

fn run_predict(args: PredictArgs) -> Result<()> {
    let accel    = args.device.resolve()?;
    let use_case = PredictUseCase::new(args.artifact_dir, args.csv_path, args.label_column);

    let report = match accel {
        Accelerator::Cpu => use_case.execute::<CpuInference>(Default::default())?,
        #[cfg(feature = "wgpu")]
        Accelerator::Gpu => use_case.execute::<GpuInference>(Default::default())?,
    };

    for (i, p) in report.predictions.iter().enumerate() {
        match report.truth.as_ref().and_then(|t| t.get(i)) {
            Some(truth) => println!("{:>5}  {:<12} {:>6.2}%  (true: {})", i + 1, p.label, p.confidence * 100.0, truth),
            None        => println!("{:>5}  {:<12} {:>6.2}%", i + 1, p.label, p.confidence * 100.0),
        }
    }
    if let Some(agreement) = report.agreement() {
        println!("\nAgreement with labels: {:.2}%", agreement * 100.0);
    }
    Ok(())
}
