// ============================================================
// Layer 4 — Batch Source and Emotion Batcher
// ============================================================
// Two halves of getting samples into the model:
//
//   BatchSource    — walks one Partition in fixed-size batches.
//                    Each call to .iter() is one full pass that
//                    visits every sample exactly once. With
//                    shuffling on, the order is re-drawn at the
//                    start of every pass from a seeded ChaCha8
//                    RNG, so runs are reproducible.
//
//   EmotionBatcher — implements Burn's Batcher trait: stacks a
//                    Vec<Sample> into a [batch, features] float
//                    tensor and a [batch] class-index tensor on
//                    the target device.
//
// Batch sizes:
//   1000 samples at batch_size 128 → ceil(1000/128) = 8 batches,
//   seven of 128 and a final one of 1000 - 7*128 = 104.
//
// Reference: Burn Book §4 (Batcher)
//            rand crate documentation (SliceRandom)

use burn::{
    data::{dataloader::batcher::Batcher, dataset::Dataset},
    prelude::*,
};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::data::splitter::Partition;
use crate::domain::error::PipelineError;
use crate::domain::sample::Sample;

// ─── BatchSource ──────────────────────────────────────────────────────────────
/// Restartable batch iterator over one partition.
pub struct BatchSource {
    order:      Vec<usize>,
    batch_size: usize,
    shuffle:    bool,
    rng:        ChaCha8Rng,
}

impl BatchSource {
    /// # Errors
    /// `InvalidConfig` if `batch_size` is zero.
    pub fn new(
        partition:  &Partition,
        batch_size: usize,
        shuffle:    bool,
        seed:       u64,
    ) -> Result<Self, PipelineError> {
        if batch_size == 0 {
            return Err(PipelineError::InvalidConfig("batch size must be positive".to_string()));
        }
        Ok(Self {
            order: partition.indices.clone(),
            batch_size,
            shuffle,
            rng: ChaCha8Rng::seed_from_u64(seed),
        })
    }

    /// Number of batches in one pass (the last one may be short)
    pub fn num_batches(&self) -> usize {
        self.order.len().div_ceil(self.batch_size)
    }

    /// Start a new pass over the partition.
    pub fn iter<'a, D: Dataset<Sample>>(&'a mut self, dataset: &'a D) -> Batches<'a, D> {
        if self.shuffle {
            self.order.shuffle(&mut self.rng);
        }
        Batches {
            dataset,
            order:      &self.order,
            batch_size: self.batch_size,
            pos:        0,
        }
    }
}

/// One lazy pass of a [`BatchSource`].
pub struct Batches<'a, D> {
    dataset:    &'a D,
    order:      &'a [usize],
    batch_size: usize,
    pos:        usize,
}

impl<D: Dataset<Sample>> Iterator for Batches<'_, D> {
    type Item = Vec<Sample>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.order.len() {
            return None;
        }
        let end = (self.pos + self.batch_size).min(self.order.len());
        let batch = self.order[self.pos..end]
            .iter()
            .filter_map(|&i| self.dataset.get(i))
            .collect();
        self.pos = end;
        Some(batch)
    }
}

// ─── EmotionBatch ─────────────────────────────────────────────────────────────
/// A batch of samples ready for the model forward pass.
#[derive(Debug, Clone)]
pub struct EmotionBatch<B: Backend> {
    /// Normalised features — shape: [batch_size, feature_dim]
    pub features: Tensor<B, 2>,

    /// Encoded class indices — shape: [batch_size]
    pub labels: Tensor<B, 1, Int>,
}

// ─── EmotionBatcher ───────────────────────────────────────────────────────────
/// Holds the target device so tensors are created on the right CPU/GPU.
#[derive(Clone, Debug)]
pub struct EmotionBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> EmotionBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<Sample, EmotionBatch<B>> for EmotionBatcher<B> {
    /// Flatten all feature rows into one Vec, build a 1D tensor,
    /// then reshape to [batch_size, feature_dim].
    fn batch(&self, items: Vec<Sample>) -> EmotionBatch<B> {
        let batch_size  = items.len();
        let feature_dim = items.first().map_or(0, |s| s.features.len());

        let flat: Vec<f32> = items
            .iter()
            .flat_map(|s| s.features.iter().copied())
            .collect();

        let labels: Vec<i32> = items.iter().map(|s| s.label as i32).collect();

        let features = Tensor::<B, 1>::from_floats(flat.as_slice(), &self.device)
            .reshape([batch_size, feature_dim]);

        let labels = Tensor::<B, 1, Int>::from_ints(labels.as_slice(), &self.device);

        EmotionBatch { features, labels }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dataset::EmotionDataset;
    use std::collections::HashSet;

    type TestBackend = burn::backend::NdArray;

    /// `n` samples over 4 balanced classes; feature 0 carries the sample index
    fn dataset(n: usize) -> EmotionDataset {
        let rows   = (0..n).map(|i| vec![i as f32, 0.5]).collect();
        let labels: Vec<usize> = (0..n).map(|i| i % 4).collect();
        EmotionDataset::from_rows(rows, &labels)
    }

    fn everything(n: usize) -> Partition {
        Partition::new((0..n).collect())
    }

    #[test]
    fn test_1000_samples_batch_128_gives_8_batches_last_104() {
        let ds         = dataset(1000);
        let mut source = BatchSource::new(&everything(1000), 128, true, 42).unwrap();

        let sizes: Vec<usize> = source.iter(&ds).map(|b| b.len()).collect();
        assert_eq!(source.num_batches(), 8);
        assert_eq!(sizes.len(), 8);
        assert!(sizes[..7].iter().all(|&s| s == 128));
        assert_eq!(sizes[7], 104);
        assert_eq!(sizes.iter().sum::<usize>(), 1000);
    }

    #[test]
    fn test_each_pass_covers_every_sample_once() {
        let ds         = dataset(300);
        let mut source = BatchSource::new(&everything(300), 64, true, 3).unwrap();

        for _ in 0..3 {
            let seen: Vec<usize> = source
                .iter(&ds)
                .flatten()
                .map(|s| s.features[0] as usize)
                .collect();
            let unique: HashSet<usize> = seen.iter().copied().collect();
            assert_eq!(seen.len(), 300);
            assert_eq!(unique.len(), 300);
        }
    }

    #[test]
    fn test_shuffle_reorders_between_passes() {
        let ds         = dataset(200);
        let mut source = BatchSource::new(&everything(200), 200, true, 11).unwrap();

        let first: Vec<f32>  = source.iter(&ds).flatten().map(|s| s.features[0]).collect();
        let second: Vec<f32> = source.iter(&ds).flatten().map(|s| s.features[0]).collect();
        assert_ne!(first, second);
    }

    #[test]
    fn test_unshuffled_source_keeps_partition_order() {
        let ds         = dataset(10);
        let partition  = Partition::new(vec![9, 3, 5]);
        let mut source = BatchSource::new(&partition, 2, false, 0).unwrap();

        let order: Vec<f32> = source.iter(&ds).flatten().map(|s| s.features[0]).collect();
        assert_eq!(order, vec![9.0, 3.0, 5.0]);
        let again: Vec<f32> = source.iter(&ds).flatten().map(|s| s.features[0]).collect();
        assert_eq!(order, again);
    }

    #[test]
    fn test_zero_batch_size_is_rejected() {
        assert!(BatchSource::new(&everything(4), 0, false, 0).is_err());
    }

    #[test]
    fn test_batcher_shapes() {
        let device  = Default::default();
        let batcher = EmotionBatcher::<TestBackend>::new(device);
        let items   = vec![
            Sample::new(vec![1.0, 2.0, 3.0], 2),
            Sample::new(vec![4.0, 5.0, 6.0], 0),
        ];

        let batch = batcher.batch(items);
        assert_eq!(batch.features.dims(), [2, 3]);
        assert_eq!(batch.labels.dims(), [2]);

        let labels: Vec<i64> = batch.labels.into_data().convert::<i64>().to_vec().unwrap();
        assert_eq!(labels, vec![2, 0]);
    }
}
