/// Guards the standardization against episodes whose advantages are all equal.
pub const STD_EPSILON: f64 = 1e-10;

/// Discounted return-to-go for every step of an episode.
///
/// Walks the rewards backwards with `R_t = r_t + gamma * R_{t+1}` and
/// `R_{T+1} = 0`, so element `t` of the output is the return from step `t`.
pub fn compute_value_function(rewards: &[f32], gamma: f32) -> Vec<f32> {
    let mut returns = vec![0.0; rewards.len()];

    let mut discounted_sum = 0.0;
    for (ndx, reward) in rewards.iter().enumerate().rev() {
        discounted_sum = reward + gamma * discounted_sum;
        returns[ndx] = discounted_sum;
    }

    returns
}

/// `(x - mean) / (std + STD_EPSILON)` using the population standard deviation.
pub fn standardize(values: &[f32]) -> Vec<f32> {
    if values.is_empty() {
        return Vec::new();
    }

    let len = values.len() as f64;
    let mean = values.iter().map(|v| *v as f64).sum::<f64>() / len;
    let variance = values
        .iter()
        .map(|v| (*v as f64 - mean).powi(2))
        .sum::<f64>()
        / len;
    let std = variance.sqrt();

    values
        .iter()
        .map(|v| ((*v as f64 - mean) / (std + STD_EPSILON)) as f32)
        .collect()
}

/// Returns minus baseline predictions, standardized.
pub fn advantages(returns: &[f32], baseline_values: Option<&[f32]>) -> Vec<f32> {
    match baseline_values {
        Some(values) => {
            let residual: Vec<f32> = returns
                .iter()
                .zip(values)
                .map(|(ret, value)| ret - value)
                .collect();

            standardize(&residual)
        }
        None => standardize(returns),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: &[f32], b: &[f32]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-4)
    }

    #[test]
    fn undiscounted_returns_are_suffix_sums() {
        let rewards = [1.0, -2.0, 0.5, 3.0];
        let returns = compute_value_function(&rewards, 1.0);

        let suffix: Vec<f32> = (0..rewards.len())
            .map(|t| rewards[t..].iter().sum())
            .collect();

        assert!(close(&returns, &suffix), "{returns:?}");
    }

    #[test]
    fn zero_discount_keeps_rewards() {
        let rewards = [0.3, 7.0, -1.0];
        assert_eq!(compute_value_function(&rewards, 0.0), rewards.to_vec());
    }

    #[test]
    fn discounted_returns() {
        let returns = compute_value_function(&[1.0, 1.0, 1.0], 0.9);
        assert!(close(&returns, &[2.71, 1.9, 1.0]), "{returns:?}");
    }

    #[test]
    fn returns_keep_length() {
        for len in [0, 1, 17, 1000] {
            let rewards = vec![1.0; len];
            assert_eq!(compute_value_function(&rewards, 0.9).len(), len);
        }
    }

    #[test]
    fn standardized_values_have_zero_mean_unit_variance() {
        let returns = compute_value_function(&[0.0, 2.0, -1.0, 5.0, 0.5], 0.9);
        let adv = standardize(&returns);

        let len = adv.len() as f32;
        let mean = adv.iter().sum::<f32>() / len;
        let variance = adv.iter().map(|a| (a - mean).powi(2)).sum::<f32>() / len;

        assert!(mean.abs() < 1e-5, "mean {mean}");
        assert!((variance - 1.0).abs() < 1e-4, "variance {variance}");
    }

    #[test]
    fn constant_values_standardize_to_finite() {
        let adv = standardize(&[4.2; 10]);

        assert!(adv.iter().all(|a| a.is_finite()));
        assert!(adv.iter().all(|a| a.abs() < 1e-3));
    }

    #[test]
    fn advantages_subtract_baseline_first() {
        let returns = [1.0, 2.0, 3.0];

        // A baseline that explains everything but a constant leaves nothing to learn from.
        let flat = advantages(&returns, Some(&[0.0, 1.0, 2.0]));
        assert!(flat.iter().all(|a| a.abs() < 1e-3));

        let plain = advantages(&returns, None);
        assert!(close(&plain, &standardize(&returns)));
    }
}
