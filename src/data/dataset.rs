use burn::data::dataset::Dataset;

use crate::domain::sample::Sample;

/// Every encoded, normalised sample of a run. Partitions index into it.
pub struct EmotionDataset {
    samples:     Vec<Sample>,
    feature_dim: usize,
}

impl EmotionDataset {
    /// Build a dataset from parallel feature rows and encoded labels.
    pub fn from_rows(rows: Vec<Vec<f32>>, labels: &[usize]) -> Self {
        let feature_dim = rows.first().map_or(0, Vec::len);
        let samples = rows
            .into_iter()
            .zip(labels)
            .map(|(features, &label)| Sample::new(features, label))
            .collect();
        Self { samples, feature_dim }
    }

    pub fn feature_dim(&self) -> usize { self.feature_dim }
}

impl Dataset<Sample> for EmotionDataset {
    fn get(&self, index: usize) -> Option<Sample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
