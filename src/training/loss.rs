use burn::{prelude::*, tensor::cast::ToElement};

use super::{
    episode::{EpisodeBuffer, History},
    returns,
};
use crate::error::{Result, TrainError};

fn check_len(what: &'static str, expected: usize, found: usize) -> Result<()> {
    if expected != found {
        return Err(TrainError::LengthMismatch {
            what,
            expected,
            found,
        });
    }

    Ok(())
}

/// Copies a 1-D tensor out to host memory.
pub fn to_vec<B: Backend>(tensor: Tensor<B, 1>) -> Result<Vec<f32>> {
    tensor
        .into_data()
        .convert::<f32>()
        .to_vec()
        .map_err(|err| TrainError::TensorData(format!("{err:?}")))
}

/// REINFORCE surrogate loss for one episode.
///
/// Records the raw episode reward and the resulting loss in `history`. The
/// advantage is the (optionally baseline-adjusted) return, standardized; the
/// loss is `-sum(log_prob * advantage)`.
pub fn compute_loss<B: Backend>(
    episode: &EpisodeBuffer<B>,
    returns: &[f32],
    baseline_values: Option<&[f32]>,
    history: &mut History,
) -> Result<Tensor<B, 1>> {
    if episode.is_empty() || returns.is_empty() {
        return Err(TrainError::EmptyEpisode);
    }

    check_len("returns", episode.len(), returns.len())?;
    check_len("log-probabilities", episode.len(), episode.log_probs.len())?;
    if let Some(values) = baseline_values {
        check_len("baseline values", episode.len(), values.len())?;
    }

    history.rewards.push(episode.total_reward());

    let log_probs = episode.log_probs()?;
    let advantages = returns::advantages(returns, baseline_values);
    let advantages = Tensor::<B, 1>::from_data(advantages.as_slice(), &log_probs.device());

    let loss = (log_probs * advantages).sum().neg();

    history.losses.push(loss.clone().into_scalar().to_f32());

    Ok(loss)
}

/// Mean squared error between baseline predictions and the observed returns.
///
/// Records the loss and the mean prediction in `history`.
pub fn compute_baseline_loss<B: Backend>(
    returns: &[f32],
    baseline_values: Tensor<B, 1>,
    history: &mut History,
) -> Result<Tensor<B, 1>> {
    let [len] = baseline_values.dims();
    if len == 0 || returns.is_empty() {
        return Err(TrainError::EmptyEpisode);
    }
    check_len("baseline values", returns.len(), len)?;

    let targets = Tensor::<B, 1>::from_data(returns, &baseline_values.device());
    let mean_prediction = baseline_values.clone().mean().into_scalar().to_f32();

    let loss = (targets - baseline_values).powf_scalar(2.0).mean();

    history.losses.push(loss.clone().into_scalar().to_f32());
    history.rewards.push(mean_prediction);

    Ok(loss)
}

#[cfg(test)]
mod tests {
    use burn::backend::{Autodiff, Candle};

    use super::*;

    type B = Autodiff<Candle>;

    fn episode(rewards: &[f32], log_probs: &[f32]) -> EpisodeBuffer<B> {
        let device = Default::default();
        let mut buffer = EpisodeBuffer::new();

        buffer.rewards.extend_from_slice(rewards);
        buffer.log_probs = log_probs
            .iter()
            .map(|lp| Tensor::<B, 1>::from_data([*lp], &device))
            .collect();

        buffer
    }

    #[test]
    fn baseline_loss_is_mean_squared_error() {
        let device = Default::default();
        let mut history = History::default();

        let values = Tensor::<B, 1>::from_data([1.0, 1.0, 1.0], &device);
        let loss = compute_baseline_loss(&[1.0, 2.0, 3.0], values, &mut history).unwrap();

        let loss = loss.into_scalar().to_f32();
        assert!((loss - 5.0 / 3.0).abs() < 1e-5, "{loss}");
        assert_eq!(history.losses.len(), 1);
        assert_eq!(history.rewards, vec![1.0]);
    }

    #[test]
    fn baseline_loss_rejects_mismatched_lengths() {
        let device = Default::default();
        let values = Tensor::<B, 1>::from_data([1.0, 1.0], &device);

        let err = compute_baseline_loss(&[1.0, 2.0, 3.0], values, &mut History::default());
        assert!(matches!(
            err,
            Err(TrainError::LengthMismatch {
                expected: 3,
                found: 2,
                ..
            })
        ));
    }

    #[test]
    fn policy_loss_weights_log_probs_by_standardized_returns() {
        let rewards = [1.0, 2.0, 3.0];
        let log_probs = [-0.5, -1.0, -2.0];
        let buffer = episode(&rewards, &log_probs);
        let returns = returns::compute_value_function(&rewards, 1.0);
        let mut history = History::default();

        let loss = compute_loss(&buffer, &returns, None, &mut history)
            .unwrap()
            .into_scalar()
            .to_f32();

        let adv = returns::standardize(&returns);
        let expected: f32 = -log_probs.iter().zip(&adv).map(|(lp, a)| lp * a).sum::<f32>();

        assert!((loss - expected).abs() < 1e-4, "{loss} != {expected}");
        assert_eq!(history.rewards, vec![6.0]);
        assert_eq!(history.losses.len(), 1);
    }

    #[test]
    fn policy_loss_is_finite_for_constant_returns() {
        let buffer = episode(&[1.0; 4], &[-1.0; 4]);
        let returns = returns::compute_value_function(&buffer.rewards, 0.0);

        let loss = compute_loss(&buffer, &returns, None, &mut History::default())
            .unwrap()
            .into_scalar()
            .to_f32();

        assert!(loss.is_finite());
    }

    #[test]
    fn policy_loss_validates_lengths() {
        let buffer = episode(&[1.0, 1.0], &[-1.0, -1.0]);
        let mut history = History::default();

        assert!(matches!(
            compute_loss(&buffer, &[1.0], None, &mut history),
            Err(TrainError::LengthMismatch { what: "returns", .. })
        ));
        assert!(matches!(
            compute_loss(&buffer, &[1.0, 1.0], Some(&[0.0]), &mut history),
            Err(TrainError::LengthMismatch {
                what: "baseline values",
                ..
            })
        ));
        assert!(matches!(
            compute_loss(&EpisodeBuffer::<B>::new(), &[], None, &mut history),
            Err(TrainError::EmptyEpisode)
        ));
        assert!(history.rewards.is_empty());
    }

    #[test]
    fn policy_loss_backpropagates_into_log_probs() {
        let device = Default::default();
        let log_prob = Tensor::<B, 1>::from_data([-1.0], &device).require_grad();

        let mut buffer = EpisodeBuffer::new();
        buffer.rewards = vec![1.0, 0.0];
        buffer.log_probs = vec![
            log_prob.clone(),
            Tensor::<B, 1>::from_data([-1.0], &device),
        ];

        let returns = returns::compute_value_function(&buffer.rewards, 1.0);
        let loss = compute_loss(&buffer, &returns, None, &mut History::default()).unwrap();

        let grads = loss.backward();
        assert!(log_prob.grad(&grads).is_some());
    }
}
