// ============================================================
// Layer 5 — Training Controller
// ============================================================
// Drives a TrainableModel through epochs until early stopping
// or the epoch budget, keeping the best checkpoint on disk.
//
// States:
//
//   RUNNING ──epoch──▶ IMPROVED  (val_loss < best: save, reset counter)
//                 └──▶ STALLED   (counter += 1)
//                          └──▶ STOPPED when counter == patience
//
// Per epoch, strictly in this order:
//   1. train phase       every train batch → one optimiser step
//   2. validation phase  every validation batch, no updates
//   3. adaptation        PlateauScheduler sees the mean val_loss
//   4. decision          IMPROVED / STALLED / STOPPED
//
// The checkpoint is written BEFORE best_val_loss is updated, so
// a failed write never advances the best loss. A write failure
// aborts the run; the previous best checkpoint stays on disk.
//
// Reported losses are the mean of the per-batch losses.

use anyhow::Result;
use burn::data::dataset::Dataset;
use serde::Serialize;
use std::fmt;

use crate::application::train_use_case::TrainConfig;
use crate::data::batcher::BatchSource;
use crate::domain::sample::Sample;
use crate::domain::traits::TrainableModel;
use crate::infra::checkpoint::CheckpointManager;
use crate::infra::metrics::{EpochMetrics, MetricsLogger};
use crate::ml::scheduler::PlateauScheduler;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControllerState {
    Running,
    Improved,
    Stalled,
    Stopped,
}

impl fmt::Display for ControllerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Running  => "RUNNING",
            Self::Improved => "IMPROVED",
            Self::Stalled  => "STALLED",
            Self::Stopped  => "STOPPED",
        };
        f.write_str(s)
    }
}

/// Mutable state of one run, owned by the controller.
#[derive(Debug, Clone)]
pub struct TrainingState {
    pub best_val_loss:              f64,
    pub epochs_without_improvement: usize,
    pub learning_rate:              f64,
    pub state:                      ControllerState,
}

impl TrainingState {
    pub fn new(learning_rate: f64) -> Self {
        Self {
            best_val_loss:              f64::INFINITY,
            epochs_without_improvement: 0,
            learning_rate,
            state:                      ControllerState::Running,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EpochRecord {
    pub epoch:         usize,
    pub train_loss:    f64,
    pub val_loss:      f64,
    pub learning_rate: f64,
    pub state:         ControllerState,
}

/// What a finished run reports back to the use case.
#[derive(Debug, Clone, Serialize)]
pub struct TrainingSummary {
    pub epochs_run:    usize,
    pub best_epoch:    Option<usize>,
    pub best_val_loss: f64,
    pub stopped_early: bool,
    pub final_lr:      f64,
    pub history:       Vec<EpochRecord>,
}

pub struct TrainingController<'a> {
    cfg:         &'a TrainConfig,
    checkpoints: &'a CheckpointManager,
    metrics:     Option<MetricsLogger>,
}

impl<'a> TrainingController<'a> {
    pub fn new(cfg: &'a TrainConfig, checkpoints: &'a CheckpointManager) -> Self {
        Self { cfg, checkpoints, metrics: None }
    }

    pub fn with_metrics(mut self, logger: MetricsLogger) -> Self {
        self.metrics = Some(logger);
        self
    }

    pub fn run<M, D>(
        &self,
        model:   &mut M,
        train:   &mut BatchSource,
        val:     &mut BatchSource,
        dataset: &D,
    ) -> Result<TrainingSummary>
    where
        M: TrainableModel,
        D: Dataset<Sample>,
    {
        self.checkpoints.clear()?;

        let mut state     = TrainingState::new(self.cfg.learning_rate);
        let mut scheduler = PlateauScheduler::new(self.cfg.lr_decay_factor, self.cfg.lr_decay_patience);
        let mut history   = Vec::new();
        let mut best_epoch = None;

        tracing::info!(
            "Training: {} train batches, {} val batches, up to {} epochs",
            train.num_batches(),
            val.num_batches(),
            self.cfg.max_epochs,
        );

        for epoch in 1..=self.cfg.max_epochs {
            state.state = ControllerState::Running;

            // ── Training phase ────────────────────────────────────────────────
            let mut train_loss_sum = 0.0f64;
            let mut train_batches  = 0usize;
            for batch in train.iter(dataset) {
                train_loss_sum += model.train_step(&batch, state.learning_rate)?;
                train_batches  += 1;
            }
            let avg_train_loss = mean(train_loss_sum, train_batches);

            // ── Validation phase ──────────────────────────────────────────────
            let mut val_loss_sum = 0.0f64;
            let mut val_batches  = 0usize;
            for batch in val.iter(dataset) {
                val_loss_sum += model.validation_loss(&batch)?;
                val_batches  += 1;
            }
            let avg_val_loss = mean(val_loss_sum, val_batches);

            // ── Adaptation ────────────────────────────────────────────────────
            state.learning_rate = scheduler.step(avg_val_loss, state.learning_rate);

            // ── Decision ──────────────────────────────────────────────────────
            if avg_val_loss < state.best_val_loss {
                let weights = model.save_state()?;
                self.checkpoints
                    .save_best(epoch, avg_val_loss, state.learning_rate, &weights)?;

                state.best_val_loss              = avg_val_loss;
                state.epochs_without_improvement = 0;
                state.state                      = ControllerState::Improved;
                best_epoch = Some(epoch);
            } else {
                state.epochs_without_improvement += 1;
                state.state = if state.epochs_without_improvement >= self.cfg.early_stopping_patience {
                    ControllerState::Stopped
                } else {
                    ControllerState::Stalled
                };
            }

            println!(
                "Epoch {:>3}/{} | train_loss={:.4} | val_loss={:.4} | lr={:.2e} | {}",
                epoch, self.cfg.max_epochs, avg_train_loss, avg_val_loss,
                state.learning_rate, state.state,
            );

            if let Some(logger) = &self.metrics {
                logger.log(&EpochMetrics::new(
                    epoch, avg_train_loss, avg_val_loss, state.learning_rate, state.state.to_string(),
                ))?;
            }

            history.push(EpochRecord {
                epoch,
                train_loss:    avg_train_loss,
                val_loss:      avg_val_loss,
                learning_rate: state.learning_rate,
                state:         state.state,
            });

            if state.state == ControllerState::Stopped {
                tracing::info!(
                    "Early stopping at epoch {}: no improvement for {} epochs",
                    epoch, state.epochs_without_improvement,
                );
                break;
            }
        }

        let stopped_early = state.state == ControllerState::Stopped;
        tracing::info!("Training complete! best epoch: {:?}", best_epoch);

        Ok(TrainingSummary {
            epochs_run: history.len(),
            best_epoch,
            best_val_loss: state.best_val_loss,
            stopped_early,
            final_lr: state.learning_rate,
            history,
        })
    }
}

fn mean(sum: f64, count: usize) -> f64 {
    if count > 0 { sum / count as f64 } else { f64::NAN }
}
