use core::f32::consts::PI;

use burn::{prelude::*, tensor::Distribution};

/// Diagonal Gaussian over a continuous action space.
#[derive(Clone, Debug)]
pub struct Normal<B: Backend> {
    pub mean: Tensor<B, 2>,
    pub log_std: Tensor<B, 2>,
}

impl<B: Backend> Normal<B> {
    pub fn new(mean: Tensor<B, 2>, log_std: Tensor<B, 2>) -> Self {
        Self { mean, log_std }
    }

    /// Draws `mean + std * noise`, detached from the graph.
    pub fn sample(&self) -> Tensor<B, 2> {
        let noise = Tensor::<B, 2>::random(
            self.mean.shape(),
            Distribution::Normal(0.0, 1.0),
            &self.mean.device(),
        );

        (self.mean.clone() + self.log_std.clone().exp() * noise).detach()
    }

    /// Log-density of `action`, summed over the action dimensions: one value per row.
    pub fn log_prob(&self, action: Tensor<B, 2>) -> Tensor<B, 1> {
        let var = self.log_std.clone().mul_scalar(2.0).exp();
        let sq = (action - self.mean.clone()).powf_scalar(2.0);

        let log_density = sq
            .div(var.mul_scalar(2.0))
            .neg()
            .sub(self.log_std.clone())
            .sub_scalar(0.5 * (2.0 * PI).ln());

        log_density.sum_dim(1).squeeze(1)
    }
}
