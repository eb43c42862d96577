use burn::{
    nn::{Linear, LinearConfig},
    prelude::*,
    tensor::{activation::relu, backend::AutodiffBackend},
};

use super::{Normal, Policy};

const LOG_STD_MIN: f32 = -5.0;
const LOG_STD_MAX: f32 = 2.0;

#[derive(Config, Debug)]
pub struct GaussianPolicyConfig {
    num_inputs: usize,
    num_actions: usize,
    #[config(default = 64)]
    hidden_size: usize,
}

impl GaussianPolicyConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> GaussianPolicy<B> {
        GaussianPolicy::new(self, device)
    }
}

/// Two hidden layers feeding separate mean and log-std heads.
#[derive(Module, Debug)]
pub struct GaussianPolicy<B: Backend> {
    fc1: Linear<B>,
    fc2: Linear<B>,
    mean: Linear<B>,
    log_std: Linear<B>,
}

impl<B: Backend> GaussianPolicy<B> {
    pub fn new(config: &GaussianPolicyConfig, device: &B::Device) -> Self {
        let fc1 = LinearConfig::new(config.num_inputs, config.hidden_size).init(device);
        let fc2 = LinearConfig::new(config.hidden_size, config.hidden_size).init(device);
        let mean = LinearConfig::new(config.hidden_size, config.num_actions).init(device);
        let log_std = LinearConfig::new(config.hidden_size, config.num_actions).init(device);

        Self {
            fc1,
            fc2,
            mean,
            log_std,
        }
    }

    pub fn distribution(&self, state: Tensor<B, 2>) -> Normal<B> {
        let x = relu(self.fc1.forward(state));
        let x = relu(self.fc2.forward(x));
        let mean = self.mean.forward(x.clone());
        let log_std = self.log_std.forward(x).clamp(LOG_STD_MIN, LOG_STD_MAX);

        Normal::new(mean, log_std)
    }
}

impl<B: AutodiffBackend> Policy<B> for GaussianPolicy<B> {
    fn forward(&self, state: Tensor<B, 2>) -> Normal<B> {
        self.distribution(state)
    }
}
