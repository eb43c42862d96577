use burn::{
    nn::{Linear, LinearConfig},
    prelude::*,
    tensor::{activation::relu, backend::AutodiffBackend},
};

use super::Baseline;

#[derive(Config, Debug)]
pub struct ValueBaselineConfig {
    num_inputs: usize,
    #[config(default = 64)]
    hidden_size: usize,
}

impl ValueBaselineConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> ValueBaseline<B> {
        ValueBaseline::new(self, device)
    }
}

#[derive(Module, Debug)]
pub struct ValueBaseline<B: Backend> {
    fc1: Linear<B>,
    fc2: Linear<B>,
    value: Linear<B>,
}

impl<B: Backend> ValueBaseline<B> {
    pub fn new(config: &ValueBaselineConfig, device: &B::Device) -> Self {
        let fc1 = LinearConfig::new(config.num_inputs, config.hidden_size).init(device);
        let fc2 = LinearConfig::new(config.hidden_size, config.hidden_size).init(device);
        let value = LinearConfig::new(config.hidden_size, 1).init(device);

        Self { fc1, fc2, value }
    }

    pub fn value(&self, state: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = relu(self.fc1.forward(state));
        let x = relu(self.fc2.forward(x));

        self.value.forward(x)
    }
}

impl<B: AutodiffBackend> Baseline<B> for ValueBaseline<B> {
    fn forward(&self, state: Tensor<B, 2>) -> Tensor<B, 2> {
        self.value(state)
    }
}
