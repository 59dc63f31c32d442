// ============================================================
// Layer 5 — Imbalance-Aware Loss
// ============================================================
// Class weights, computed once from the TRAINING partition:
//
//   weight[c] = n / (K × count(c))
//
// where n is the number of training samples and K the number
// of classes present in them. Rare classes get large weights,
// frequent ones small weights, and Σ count(c)·weight[c] = n.
// A class with no training samples gets weight 0 (it can never
// be a target, so the value only has to be finite).
//
// Weighted cross-entropy over a batch is the weighted mean:
//
//   loss = Σ w[y_i] · nll_i / Σ w[y_i]
//
// which is what Burn's CrossEntropyLoss computes when it is
// given per-class weights.
//
// Reference: Burn Book §5 (Loss functions)

use burn::{nn::loss::CrossEntropyLossConfig, prelude::*};

/// Per-class weights from encoded training labels.
pub fn compute_class_weights(labels: &[usize], num_classes: usize) -> Vec<f32> {
    let mut counts = vec![0usize; num_classes];
    for &l in labels {
        if l < num_classes {
            counts[l] += 1;
        }
    }

    let total   = counts.iter().sum::<usize>() as f64;
    let present = counts.iter().filter(|&&c| c > 0).count() as f64;

    counts
        .iter()
        .map(|&c| if c == 0 { 0.0 } else { (total / (present * c as f64)) as f32 })
        .collect()
}

/// Weighted categorical cross-entropy with fixed class weights.
#[derive(Debug, Clone)]
pub struct WeightedCrossEntropy {
    weights: Vec<f32>,
}

impl WeightedCrossEntropy {
    pub fn new(weights: Vec<f32>) -> Self {
        Self { weights }
    }

    /// logits: [batch, K], targets: [batch] → scalar loss tensor [1]
    pub fn forward<B: Backend>(
        &self,
        logits:  Tensor<B, 2>,
        targets: Tensor<B, 1, Int>,
    ) -> Tensor<B, 1> {
        CrossEntropyLossConfig::new()
            .with_weights(Some(self.weights.clone()))
            .init(&logits.device())
            .forward(logits, targets)
    }
}
