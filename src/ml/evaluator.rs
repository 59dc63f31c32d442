// ============================================================
// Layer 5 — Evaluator
// ============================================================
// Scores the BEST CHECKPOINT (not the in-memory weights) on the
// validation partition:
//
//   1. load best_checkpoint.json + weights into the model
//   2. one no-gradient pass over every validation batch
//   3. prediction = argmax of the logits (first index on ties)
//   4. accuracy plus per-class precision / recall / F1 / support,
//      keyed by the original label strings
//
// Classes appear in the report when they occur in the truth or
// in the predictions. A 0/0 ratio is reported as 0.
//
// Report layout follows the familiar classification report:
//
//                 precision    recall  f1-score   support
//         angry      0.8123    0.7900    0.8010       200
//         ...
//      accuracy                          0.7712      1000
//     macro avg      0.7701    0.7688    0.7690      1000
//  weighted avg      0.7725    0.7712    0.7714      1000

use anyhow::Result;
use burn::data::dataset::Dataset;
use serde::Serialize;
use std::fmt;

use crate::data::batcher::BatchSource;
use crate::data::label_encoder::LabelEncoder;
use crate::domain::sample::Sample;
use crate::domain::traits::TrainableModel;
use crate::infra::checkpoint::CheckpointManager;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassMetrics {
    pub label:     String,
    pub precision: f64,
    pub recall:    f64,
    pub f1:        f64,
    pub support:   usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AverageMetrics {
    pub precision: f64,
    pub recall:    f64,
    pub f1:        f64,
    pub support:   usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub checkpoint_epoch:    usize,
    pub checkpoint_val_loss: f64,
    pub samples:             usize,
    pub accuracy:            f64,
    pub classes:             Vec<ClassMetrics>,
    pub macro_avg:           AverageMetrics,
    pub weighted_avg:        AverageMetrics,
}

pub struct Evaluator<'a> {
    checkpoints: &'a CheckpointManager,
    encoder:     &'a LabelEncoder,
}

impl<'a> Evaluator<'a> {
    pub fn new(checkpoints: &'a CheckpointManager, encoder: &'a LabelEncoder) -> Self {
        Self { checkpoints, encoder }
    }

    /// # Errors
    /// `MissingCheckpoint` if no checkpoint was ever written.
    pub fn evaluate<M, D>(
        &self,
        model:   &mut M,
        val:     &mut BatchSource,
        dataset: &D,
    ) -> Result<EvaluationReport>
    where
        M: TrainableModel,
        D: Dataset<Sample>,
    {
        let (meta, weights) = self.checkpoints.load_best()?;
        model.load_state(weights)?;

        let k = self.encoder.len();
        // confusion[truth][predicted]
        let mut confusion = vec![vec![0usize; k]; k];

        for batch in val.iter(dataset) {
            let logits = model.logits(&batch)?;
            for (row, sample) in logits.iter().zip(&batch) {
                let pred = argmax(row);
                if sample.label < k && pred < k {
                    confusion[sample.label][pred] += 1;
                }
            }
        }

        let report = self.build_report(&confusion, meta.epoch, meta.val_loss);
        tracing::info!(
            "Evaluated checkpoint from epoch {}: accuracy={:.4} over {} samples",
            report.checkpoint_epoch, report.accuracy, report.samples,
        );
        Ok(report)
    }

    fn build_report(&self, confusion: &[Vec<usize>], epoch: usize, val_loss: f64) -> EvaluationReport {
        let k       = confusion.len();
        let samples = confusion.iter().flatten().sum::<usize>();
        let correct = (0..k).map(|c| confusion[c][c]).sum::<usize>();

        let mut classes = Vec::new();
        for c in 0..k {
            let tp        = confusion[c][c];
            let support   = confusion[c].iter().sum::<usize>();
            let predicted = confusion.iter().map(|row| row[c]).sum::<usize>();
            if support == 0 && predicted == 0 {
                continue;
            }

            let precision = ratio(tp, predicted);
            let recall    = ratio(tp, support);
            let f1 = if precision + recall > 0.0 {
                2.0 * precision * recall / (precision + recall)
            } else {
                0.0
            };

            classes.push(ClassMetrics {
                label: self.encoder.decode(c).unwrap_or("?").to_string(),
                precision,
                recall,
                f1,
                support,
            });
        }

        EvaluationReport {
            checkpoint_epoch:    epoch,
            checkpoint_val_loss: val_loss,
            samples,
            accuracy:            ratio(correct, samples),
            macro_avg:           average(&classes, false),
            weighted_avg:        average(&classes, true),
            classes,
        }
    }
}

/// Index of the largest logit; the first one wins ties.
pub fn argmax(row: &[f32]) -> usize {
    let mut best = 0;
    for (i, &v) in row.iter().enumerate() {
        if v > row[best] {
            best = i;
        }
    }
    best
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

fn average(classes: &[ClassMetrics], weighted: bool) -> AverageMetrics {
    let support = classes.iter().map(|c| c.support).sum::<usize>();
    let weight  = |c: &ClassMetrics| if weighted { c.support as f64 } else { 1.0 };
    let total   = classes.iter().map(weight).sum::<f64>();

    let avg = |f: fn(&ClassMetrics) -> f64| {
        if total > 0.0 {
            classes.iter().map(|c| f(c) * weight(c)).sum::<f64>() / total
        } else {
            0.0
        }
    };

    AverageMetrics {
        precision: avg(|c| c.precision),
        recall:    avg(|c| c.recall),
        f1:        avg(|c| c.f1),
        support,
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .classes
            .iter()
            .map(|c| c.label.len())
            .chain(std::iter::once("weighted avg".len()))
            .max()
            .unwrap_or(12);

        writeln!(
            f,
            "Best checkpoint: epoch {} (val_loss={:.4})",
            self.checkpoint_epoch, self.checkpoint_val_loss,
        )?;
        writeln!(f, "Accuracy: {:.2}%\n", self.accuracy * 100.0)?;
        writeln!(f, "{:>width$}  {:>9} {:>9} {:>9} {:>9}", "", "precision", "recall", "f1-score", "support")?;
        for c in &self.classes {
            writeln!(
                f,
                "{:>width$}  {:>9.4} {:>9.4} {:>9.4} {:>9}",
                c.label, c.precision, c.recall, c.f1, c.support,
            )?;
        }
        writeln!(f)?;
        writeln!(f, "{:>width$}  {:>9} {:>9} {:>9.4} {:>9}", "accuracy", "", "", self.accuracy, self.samples)?;
        for (name, avg) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{:>width$}  {:>9.4} {:>9.4} {:>9.4} {:>9}",
                name, avg.precision, avg.recall, avg.f1, avg.support,
            )?;
        }
        Ok(())
    }
}
