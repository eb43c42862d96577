use burn::{
    module::AutodiffModule,
    prelude::*,
    tensor::backend::AutodiffBackend,
};

pub mod distribution;
pub mod gaussian;
pub mod value;

pub use distribution::Normal;
pub use gaussian::{GaussianPolicy, GaussianPolicyConfig};
pub use value::{ValueBaseline, ValueBaselineConfig};

/// A stochastic policy trained with policy gradients.
pub trait Policy<B>: AutodiffModule<B>
where
    B: AutodiffBackend,
{
    /// Maps a `[batch, observation]` state to a Gaussian over actions.
    fn forward(&self, state: Tensor<B, 2>) -> Normal<B>;

    /// Samples an action for each row of `state` and returns it together with
    /// its log-probability. The action carries no gradient, the
    /// log-probability does.
    fn sample_action(&self, state: Tensor<B, 2>) -> (Tensor<B, 2>, Tensor<B, 1>) {
        let dist = self.forward(state);
        let action = dist.sample();
        let log_prob = dist.log_prob(action.clone());

        (action, log_prob)
    }
}

/// A learned state-value function used to reduce policy-gradient variance.
pub trait Baseline<B>: AutodiffModule<B>
where
    B: AutodiffBackend,
{
    /// Maps a `[batch, observation]` state to value estimates.
    fn forward(&self, state: Tensor<B, 2>) -> Tensor<B, 2>;
}

/// Lifts a single observation into a `[1, observation]` tensor.
pub fn to_batch<B: Backend>(state: &[f32], device: &B::Device) -> Tensor<B, 2> {
    Tensor::<B, 1>::from_data(state, device).reshape([1, -1])
}
