use burn::{prelude::*, tensor::backend::AutodiffBackend};
use serde::Serialize;

use crate::{
    env::Environment,
    error::{Result, TrainError},
    model::{self, Baseline, Policy},
};

/// Rewards and action log-probabilities collected over one episode.
#[derive(Clone, Debug)]
pub struct EpisodeBuffer<B: Backend> {
    pub rewards: Vec<f32>,
    pub log_probs: Vec<Tensor<B, 1>>,
}

impl<B: Backend> EpisodeBuffer<B> {
    pub fn new() -> Self {
        Self {
            rewards: Vec::new(),
            log_probs: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }

    pub fn total_reward(&self) -> f32 {
        self.rewards.iter().sum()
    }

    /// Concatenates the per-step log-probabilities in temporal order.
    pub fn log_probs(&self) -> Result<Tensor<B, 1>> {
        if self.log_probs.is_empty() {
            return Err(TrainError::EmptyEpisode);
        }

        Ok(Tensor::cat(self.log_probs.clone(), 0))
    }

    pub fn reset(&mut self) {
        self.rewards.clear();
        self.log_probs.clear();
    }
}

impl<B: Backend> Default for EpisodeBuffer<B> {
    fn default() -> Self {
        Self::new()
    }
}

/// Baseline predictions collected over one episode, one per step.
#[derive(Clone, Debug)]
pub struct BaselineBuffer<B: Backend> {
    pub values: Vec<Tensor<B, 1>>,
}

impl<B: Backend> BaselineBuffer<B> {
    pub fn new() -> Self {
        Self { values: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> Result<Tensor<B, 1>> {
        if self.values.is_empty() {
            return Err(TrainError::EmptyEpisode);
        }

        Ok(Tensor::cat(self.values.clone(), 0))
    }

    pub fn reset(&mut self) {
        self.values.clear();
    }
}

impl<B: Backend> Default for BaselineBuffer<B> {
    fn default() -> Self {
        Self::new()
    }
}

/// Cross-episode log kept for reporting.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct History {
    pub rewards: Vec<f32>,
    pub losses: Vec<f32>,
}

/// Samples an action for the current state and records its log-probability.
pub fn select_action<B, P>(
    policy: &P,
    state: &[f32],
    buffer: &mut EpisodeBuffer<B>,
    device: &B::Device,
) -> Result<Vec<f32>>
where
    B: AutodiffBackend,
    P: Policy<B>,
{
    let state = model::to_batch::<B>(state, device);
    let (action, log_prob) = policy.sample_action(state);

    buffer.log_probs.push(log_prob);

    action
        .into_data()
        .convert::<f32>()
        .to_vec()
        .map_err(|err| TrainError::TensorData(format!("{err:?}")))
}

/// Plays `horizon` steps from the environment's current state.
///
/// There is no early termination: the episode always lasts `horizon` steps.
pub fn play_episode<B, P, V, E>(
    policy: &P,
    baseline: Option<(&V, &mut BaselineBuffer<B>)>,
    env: &mut E,
    horizon: usize,
    buffer: &mut EpisodeBuffer<B>,
    device: &B::Device,
) -> Result<()>
where
    B: AutodiffBackend,
    P: Policy<B>,
    V: Baseline<B>,
    E: Environment,
{
    let mut baseline = baseline;

    for _ in 0..horizon {
        let action = select_action(policy, env.state(), buffer, device)?;

        if let Some((model, values)) = baseline.as_mut() {
            let state = model::to_batch::<B>(env.state(), device);
            values.values.push(model.forward(state).reshape([-1]));
        }

        let reward = env.step(&action);
        buffer.rewards.push(reward);
    }

    Ok(())
}
