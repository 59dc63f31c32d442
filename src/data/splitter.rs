// ============================================================
// Layer 4 — Stratified Train/Validation Splitter
// ============================================================
// Splits sample indices into a training partition and a
// validation partition so that every class keeps the same
// share of its samples in validation.
//
// Every class keeps at least one sample on each side, so the
// validation loss always sees every class.
//
// Algorithm, per class c (classes visited in index order):
//   1. collect the indices of class c
//   2. shuffle them with a ChaCha8 RNG seeded once from `seed`
//   3. n_val(c) = round(count(c) * fraction), clamped to
//      [1, count(c) - 1] so both sides are non-empty
//   4. the first n_val(c) go to validation, the rest to training
//
// Same labels + same seed → same partitions, on every platform.
//
// Reference: rand / rand_chacha crate documentation

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::domain::error::PipelineError;

/// An index subset of the full sample set.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Partition {
    pub indices: Vec<usize>,
}

impl Partition {
    pub fn new(indices: Vec<usize>) -> Self {
        Self { indices }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Labels of the samples in this partition, in partition order.
    pub fn labels(&self, all_labels: &[usize]) -> Vec<usize> {
        self.indices.iter().map(|&i| all_labels[i]).collect()
    }
}

/// Stratified split of `labels` (encoded class indices) into `(train, validation)`.
///
/// # Errors
/// * `InvalidConfig` if `fraction` is not strictly between 0 and 1
/// * `InsufficientSamples` if any class has fewer than two members
pub fn stratified_split(
    labels:   &[usize],
    fraction: f64,
    seed:     u64,
) -> Result<(Partition, Partition), PipelineError> {
    if !(fraction > 0.0 && fraction < 1.0) {
        return Err(PipelineError::InvalidConfig(format!(
            "validation fraction must be in (0, 1), got {fraction}"
        )));
    }

    let num_classes = labels.iter().max().map_or(0, |&m| m + 1);
    let mut by_class: Vec<Vec<usize>> = vec![Vec::new(); num_classes];
    for (i, &label) in labels.iter().enumerate() {
        by_class[label].push(i);
    }

    let mut rng   = ChaCha8Rng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(labels.len());
    let mut val   = Vec::new();

    for (class, mut members) in by_class.into_iter().enumerate() {
        // Class indices that never occur (e.g. from a reused encoder) are skipped
        if members.is_empty() {
            continue;
        }
        let count = members.len();
        if count < 2 {
            return Err(PipelineError::InsufficientSamples { class, count, fraction });
        }

        members.shuffle(&mut rng);

        let n_val = ((count as f64) * fraction).round() as usize;
        let n_val = n_val.clamp(1, count - 1);

        val.extend_from_slice(&members[..n_val]);
        train.extend_from_slice(&members[n_val..]);
    }

    tracing::debug!(
        "Stratified split: {} training, {} validation (fraction {})",
        train.len(),
        val.len(),
        fraction,
    );

    Ok((Partition::new(train), Partition::new(val)))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    /// 5 classes with deliberately uneven sizes
    fn imbalanced_labels() -> Vec<usize> {
        let sizes = [120, 45, 31, 9, 300];
        sizes
            .iter()
            .enumerate()
            .flat_map(|(c, &n)| std::iter::repeat(c).take(n))
            .collect()
    }

    #[test]
    fn test_partitions_are_disjoint_and_exhaustive() {
        let labels       = imbalanced_labels();
        let (train, val) = stratified_split(&labels, 0.2, 42).unwrap();

        let t: HashSet<usize> = train.indices.iter().copied().collect();
        let v: HashSet<usize> = val.indices.iter().copied().collect();
        assert!(t.is_disjoint(&v));
        assert_eq!(t.len() + v.len(), labels.len());
        assert_eq!(train.len() + val.len(), labels.len());
    }

    #[test]
    fn test_every_class_keeps_its_proportion() {
        let labels       = imbalanced_labels();
        let fraction     = 0.2;
        let (_, val)     = stratified_split(&labels, fraction, 7).unwrap();
        let val_labels   = val.labels(&labels);

        for class in 0..5 {
            let total = labels.iter().filter(|&&l| l == class).count() as f64;
            let in_val = val_labels.iter().filter(|&&l| l == class).count() as f64;
            // Within one sample's worth of rounding
            assert!(
                (in_val / total - fraction).abs() <= 1.0 / total,
                "class {class}: {in_val}/{total}"
            );
        }
    }

    #[test]
    fn test_same_seed_same_split() {
        let labels = imbalanced_labels();
        let a      = stratified_split(&labels, 0.25, 99).unwrap();
        let b      = stratified_split(&labels, 0.25, 99).unwrap();
        assert_eq!(a, b);

        let c = stratified_split(&labels, 0.25, 100).unwrap();
        assert_ne!(a.1, c.1);
    }

    #[test]
    fn test_singleton_class_is_insufficient() {
        let labels = vec![0, 0, 0, 1, 2, 2];
        let err    = stratified_split(&labels, 0.2, 42).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::InsufficientSamples { class: 1, count: 1, .. }
        ));
    }

    #[test]
    fn test_small_class_still_gets_both_sides() {
        // round(2 * 0.2) = 0 would leave validation empty for class 1
        let labels       = vec![0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 1];
        let (train, val) = stratified_split(&labels, 0.2, 1).unwrap();
        assert_eq!(val.labels(&labels).iter().filter(|&&l| l == 1).count(), 1);
        assert_eq!(train.labels(&labels).iter().filter(|&&l| l == 1).count(), 1);
    }

    #[test]
    fn test_fraction_out_of_range_is_rejected() {
        assert!(stratified_split(&[0, 0, 1, 1], 0.0, 1).is_err());
        assert!(stratified_split(&[0, 0, 1, 1], 1.0, 1).is_err());
    }
}
