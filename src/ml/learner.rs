// ============================================================
// Layer 5 — Classifier Learner
// ============================================================
// Couples the Burn model with its optimiser and loss, and
// exposes the result through the burn-free TrainableModel trait
// the training controller and evaluator drive.
//
// One train step:
//   samples → EmotionBatcher → forward → weighted CE
//           → backward → GradientsParams → Adam step
//
// Validation and logits go through model.valid(), which returns
// the model on the inner (non-autodiff) backend: no gradient
// graph is built and dropout is an identity.
//
// Weights are (de)serialised with Burn's NamedMpkBytesRecorder
// at full precision; the checkpoint manager owns the file I/O.
//
// Reference: Burn Book §5 (Custom training loop)
//            Kingma & Ba (2015) Adam

use anyhow::{anyhow, Result};
use burn::{
    data::dataloader::batcher::Batcher,
    module::AutodiffModule,
    optim::{decay::WeightDecayConfig, AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkBytesRecorder, Recorder},
    tensor::backend::AutodiffBackend,
};

use crate::data::batcher::{EmotionBatch, EmotionBatcher};
use crate::domain::sample::Sample;
use crate::domain::traits::TrainableModel;
use crate::ml::loss::WeightedCrossEntropy;
use crate::ml::model::{EmotionClassifier, EmotionClassifierConfig};

/// Fresh classifier with Adam (weight decay) and weighted cross-entropy.
pub fn build_learner<B: AutodiffBackend>(
    input_dim:     usize,
    class_weights: Vec<f32>,
    weight_decay:  f64,
    device:        &B::Device,
) -> impl TrainableModel {
    let model = EmotionClassifierConfig::new(input_dim, class_weights.len()).init::<B>(device);
    let optim = AdamConfig::new()
        .with_weight_decay(Some(WeightDecayConfig::new(weight_decay as f32)))
        .init::<B, EmotionClassifier<B>>();
    tracing::info!("Model ready: {} parameters", model.num_params());
    ClassifierLearner::new(model, optim, WeightedCrossEntropy::new(class_weights), device.clone())
}

pub struct ClassifierLearner<B: AutodiffBackend, O> {
    model:         EmotionClassifier<B>,
    optim:         O,
    criterion:     WeightedCrossEntropy,
    device:        B::Device,
    train_batcher: EmotionBatcher<B>,
    valid_batcher: EmotionBatcher<B::InnerBackend>,
}

impl<B, O> ClassifierLearner<B, O>
where
    B: AutodiffBackend,
    O: Optimizer<EmotionClassifier<B>, B>,
{
    pub fn new(
        model:     EmotionClassifier<B>,
        optim:     O,
        criterion: WeightedCrossEntropy,
        device:    B::Device,
    ) -> Self {
        Self {
            model,
            optim,
            criterion,
            train_batcher: EmotionBatcher::new(device.clone()),
            valid_batcher: EmotionBatcher::new(device.clone()),
            device,
        }
    }

    /// logits: [batch, K], with gradient tracking
    pub fn forward(&self, batch: &EmotionBatch<B>) -> Tensor<B, 2> {
        self.model.forward(batch.features.clone())
    }

    pub fn backward(&self, loss: Tensor<B, 1>) -> GradientsParams {
        GradientsParams::from_grads(loss.backward(), &self.model)
    }

    /// Apply one optimiser update at `learning_rate`.
    pub fn step(&mut self, learning_rate: f64, grads: GradientsParams) {
        self.model = self.optim.step(learning_rate, self.model.clone(), grads);
    }

    fn valid_logits(&self, batch: &[Sample]) -> (Tensor<B::InnerBackend, 2>, EmotionBatch<B::InnerBackend>) {
        let batch = self.valid_batcher.batch(batch.to_vec());
        let model = self.model.valid();
        (model.forward(batch.features.clone()), batch)
    }
}

impl<B, O> TrainableModel for ClassifierLearner<B, O>
where
    B: AutodiffBackend,
    O: Optimizer<EmotionClassifier<B>, B>,
{
    fn train_step(&mut self, batch: &[Sample], learning_rate: f64) -> Result<f64> {
        let batch  = self.train_batcher.batch(batch.to_vec());
        let logits = self.forward(&batch);
        let loss   = self.criterion.forward(logits, batch.labels);

        let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();
        let grads = self.backward(loss);
        self.step(learning_rate, grads);
        Ok(loss_val)
    }

    fn validation_loss(&self, batch: &[Sample]) -> Result<f64> {
        let (logits, batch) = self.valid_logits(batch);
        Ok(self.criterion.forward(logits, batch.labels).into_scalar().elem::<f64>())
    }

    fn logits(&self, batch: &[Sample]) -> Result<Vec<Vec<f32>>> {
        let (logits, _) = self.valid_logits(batch);
        let [_, k] = logits.dims();
        let flat = logits
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| anyhow!("Cannot read logits: {e:?}"))?;
        Ok(flat.chunks(k.max(1)).map(<[f32]>::to_vec).collect())
    }

    fn save_state(&self) -> Result<Vec<u8>> {
        NamedMpkBytesRecorder::<FullPrecisionSettings>::new()
            .record(self.model.clone().into_record(), ())
            .map_err(|e| anyhow!("Cannot serialise model weights: {e:?}"))
    }

    fn load_state(&mut self, state: Vec<u8>) -> Result<()> {
        let record = NamedMpkBytesRecorder::<FullPrecisionSettings>::new()
            .load(state, &self.device)
            .map_err(|e| anyhow!("Cannot deserialise model weights: {e:?}"))?;
        self.model = self.model.clone().load_record(record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestBackend = burn::backend::Autodiff<burn::backend::NdArray>;

    fn learner() -> impl TrainableModel {
        let device = Default::default();
        let model  = EmotionClassifierConfig::new(2, 2)
            .with_dropout(0.0)
            .init::<TestBackend>(&device);
        let optim  = AdamConfig::new().init::<TestBackend, EmotionClassifier<TestBackend>>();
        ClassifierLearner::new(model, optim, WeightedCrossEntropy::new(vec![1.0, 1.0]), device)
    }

    fn separable() -> Vec<Sample> {
        (0..8)
            .map(|i| {
                let label = i % 2;
                let sign  = if label == 0 { -1.0 } else { 1.0 };
                Sample::new(vec![sign * (1.0 + i as f32 * 0.1), sign], label)
            })
            .collect()
    }

    #[test]
    fn test_training_steps_reduce_validation_loss() {
        let mut model = learner();
        let data      = separable();

        let before = model.validation_loss(&data).unwrap();
        for _ in 0..60 {
            model.train_step(&data, 1e-2).unwrap();
        }
        let after = model.validation_loss(&data).unwrap();

        assert!(after < before, "before={before}, after={after}");
    }

    #[test]
    fn test_logits_have_one_row_per_sample() {
        let model  = learner();
        let logits = model.logits(&separable()).unwrap();
        assert_eq!(logits.len(), 8);
        assert!(logits.iter().all(|row| row.len() == 2));
    }

    #[test]
    fn test_state_round_trip_restores_logits() {
        let data     = separable();
        let source   = learner();
        let mut copy = learner();

        copy.load_state(source.save_state().unwrap()).unwrap();

        let a = source.logits(&data).unwrap();
        let b = copy.logits(&data).unwrap();
        for (ra, rb) in a.iter().zip(&b) {
            for (x, y) in ra.iter().zip(rb) {
                assert!((x - y).abs() < 1e-6);
            }
        }
    }
}
