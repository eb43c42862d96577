use burn::{
    module::AutodiffModule,
    optim::{Adam, AdamConfig, GradientsParams, Optimizer, adaptor::OptimizerAdaptor},
    tensor::{Tensor, backend::AutodiffBackend, cast::ToElement},
};
use log::debug;

use super::episode::History;
use crate::error::{LossKind, Result, TrainError};

/// A trainable module, its optimizer state and its training log.
pub struct Learner<B, M>
where
    B: AutodiffBackend,
    M: AutodiffModule<B>,
{
    model: M,
    optim: OptimizerAdaptor<Adam, M, B>,
    learning_rate: f64,
    kind: LossKind,
    updates: usize,
    pub history: History,
}

impl<B, M> Learner<B, M>
where
    B: AutodiffBackend,
    M: AutodiffModule<B>,
{
    pub fn new(model: M, optimizer: &AdamConfig, learning_rate: f64, kind: LossKind) -> Self {
        Self {
            model,
            optim: optimizer.init(),
            learning_rate,
            kind,
            updates: 0,
            history: History::default(),
        }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn into_model(self) -> M {
        self.model
    }

    pub fn updates(&self) -> usize {
        self.updates
    }

    /// Backpropagates `loss` and applies one optimizer step.
    ///
    /// Gradients are collected fresh from this backward pass, so nothing
    /// accumulates between steps.
    pub fn fit(mut self, loss: Tensor<B, 1>, episode: usize) -> Result<Self> {
        let value = loss.clone().into_scalar().to_f32();
        if !value.is_finite() {
            return Err(TrainError::NonFiniteLoss {
                kind: self.kind,
                episode,
                value,
            });
        }

        let grads = GradientsParams::from_grads(loss.backward(), &self.model);
        self.model = self.optim.step(self.learning_rate, self.model, grads);
        self.updates += 1;

        debug!(
            "{} step {} at episode {}: loss {:.4}",
            self.kind, self.updates, episode, value
        );

        Ok(self)
    }
}

/// Sums per-episode losses until a batch is complete.
pub struct Accumulator<B: AutodiffBackend> {
    loss: Option<Tensor<B, 1>>,
    count: usize,
}

impl<B: AutodiffBackend> Accumulator<B> {
    pub fn new() -> Self {
        Self {
            loss: None,
            count: 0,
        }
    }

    pub fn push(&mut self, loss: Tensor<B, 1>) {
        self.loss = Some(match self.loss.take() {
            Some(total) => total + loss,
            None => loss,
        });
        self.count += 1;
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// The mean of the accumulated losses, emptying the accumulator.
    pub fn take_mean(&mut self) -> Option<Tensor<B, 1>> {
        let count = self.count;
        self.count = 0;

        self.loss.take().map(|loss| loss.div_scalar(count as f32))
    }
}

impl<B: AutodiffBackend> Default for Accumulator<B> {
    fn default() -> Self {
        Self::new()
    }
}
