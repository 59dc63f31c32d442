use burn::{
    nn::{Dropout, DropoutConfig, Linear, LinearConfig, Relu},
    prelude::*,
};

#[derive(Config, Debug)]
pub struct EmotionClassifierConfig {
    pub input_dim:   usize,
    pub num_classes: usize,
    #[config(default = 256)]
    pub hidden_1:    usize,
    #[config(default = 128)]
    pub hidden_2:    usize,
    #[config(default = 64)]
    pub hidden_3:    usize,
    #[config(default = 0.3)]
    pub dropout:     f64,
}

impl EmotionClassifierConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> EmotionClassifier<B> {
        EmotionClassifier {
            fc1:     LinearConfig::new(self.input_dim, self.hidden_1).init(device),
            fc2:     LinearConfig::new(self.hidden_1, self.hidden_2).init(device),
            fc3:     LinearConfig::new(self.hidden_2, self.hidden_3).init(device),
            fc4:     LinearConfig::new(self.hidden_3, self.num_classes).init(device),
            relu:    Relu::new(),
            dropout: DropoutConfig::new(self.dropout).init(),
        }
    }
}

/// Feed-forward classifier: three ReLU + dropout hidden layers, then K logits.
#[derive(Module, Debug)]
pub struct EmotionClassifier<B: Backend> {
    pub fc1:     Linear<B>,
    pub fc2:     Linear<B>,
    pub fc3:     Linear<B>,
    pub fc4:     Linear<B>,
    pub relu:    Relu,
    pub dropout: Dropout,
}

impl<B: Backend> EmotionClassifier<B> {
    /// features: [batch, input_dim] → logits: [batch, num_classes]
    ///
    /// Dropout is only active on autodiff backends; after `.valid()`
    /// the inner backend makes it an identity.
    pub fn forward(&self, features: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.dropout.forward(self.relu.forward(self.fc1.forward(features)));
        let x = self.dropout.forward(self.relu.forward(self.fc2.forward(x)));
        let x = self.dropout.forward(self.relu.forward(self.fc3.forward(x)));
        self.fc4.forward(x)
    }
}
