use std::path::PathBuf;

use burn::{config::Config, optim::AdamConfig, tensor::backend::AutodiffBackend};
use log::info;

use super::{
    checkpoint::{self, Checkpointer},
    episode::{BaselineBuffer, EpisodeBuffer, History, play_episode},
    learner::{Accumulator, Learner},
    loss::{compute_baseline_loss, compute_loss, to_vec},
    report::{Reporter, Snapshot},
    returns::compute_value_function,
};
use crate::{
    env::Environment,
    error::{LossKind, TrainError},
    model::{Baseline, Policy, ValueBaseline},
};

#[derive(Config)]
pub struct TrainingConfig {
    /// checkpoints, reports and a copy of this config are written here
    pub artifact_dir: String,
    pub optimizer: AdamConfig,
    pub baseline_optimizer: AdamConfig,

    #[config(default = 1e-4)]
    pub learning_rate: f64,

    #[config(default = 1e-3)]
    pub baseline_learning_rate: f64,

    #[config(default = 1000)]
    pub episodes: usize,

    #[config(default = 1000)]
    /// steps per episode, episodes never end early
    pub horizon: usize,

    #[config(default = 0.9)]
    /// discount future rewards
    pub gamma: f32,

    #[config(default = 1)]
    /// episodes per policy update
    pub batch: usize,

    #[config(default = false)]
    /// batch baseline updates like policy updates instead of stepping every episode
    pub batch_baseline: bool,

    #[config(default = true)]
    pub verbose: bool,

    #[config(default = true)]
    pub save_policy: bool,

    #[config(default = 100)]
    pub checkpoint_every: usize,

    #[config(default = 10)]
    pub report_every: usize,

    #[config(default = false)]
    /// wipe a non-empty artifact directory instead of refusing to start
    pub overwrite: bool,

    /// Seeds the backend before the first episode. Leave unset on backends
    /// without manual seeding (candle panics on `seed`).
    pub seed: Option<u64>,
}

impl TrainingConfig {
    pub fn validate(&self) -> crate::error::Result<()> {
        let invalid = |msg: &str| Err(TrainError::InvalidConfig(msg.to_string()));

        if !(0.0..=1.0).contains(&self.gamma) {
            return invalid("gamma must be within [0, 1]");
        }
        if self.batch == 0 {
            return invalid("batch must be at least 1");
        }
        if self.horizon == 0 {
            return invalid("horizon must be at least 1");
        }
        if self.checkpoint_every == 0 || self.report_every == 0 {
            return invalid("checkpoint and report intervals must be at least 1");
        }
        if !(self.learning_rate > 0.0 && self.baseline_learning_rate > 0.0) {
            return invalid("learning rates must be positive");
        }

        Ok(())
    }

    pub fn init<B, P>(self, policy: P, device: B::Device) -> Trainer<B, P, ValueBaseline<B>>
    where
        B: AutodiffBackend,
        P: Policy<B>,
    {
        Trainer::new(self, policy, device)
    }
}

/// What a finished run hands back.
pub struct Trained<P, V> {
    pub policy: P,
    pub baseline: Option<V>,
    pub policy_history: History,
    pub baseline_history: Option<History>,
    pub policy_updates: usize,
    pub baseline_updates: usize,
    pub checkpoints: Vec<PathBuf>,
}

pub struct Trainer<B, P, V>
where
    B: AutodiffBackend,
    P: Policy<B>,
    V: Baseline<B>,
{
    config: TrainingConfig,
    policy: Learner<B, P>,
    baseline: Option<Learner<B, V>>,
    device: B::Device,
}

impl<B, P> Trainer<B, P, ValueBaseline<B>>
where
    B: AutodiffBackend,
    P: Policy<B>,
{
    pub fn new(config: TrainingConfig, policy: P, device: B::Device) -> Self {
        let policy = Learner::new(
            policy,
            &config.optimizer,
            config.learning_rate,
            LossKind::Policy,
        );

        Self {
            config,
            policy,
            baseline: None,
            device,
        }
    }
}

impl<B, P, V> Trainer<B, P, V>
where
    B: AutodiffBackend,
    P: Policy<B>,
    V: Baseline<B>,
{
    /// Trains `baseline` alongside the policy and subtracts its predictions
    /// from the returns.
    pub fn with_baseline<W: Baseline<B>>(self, baseline: W) -> Trainer<B, P, W> {
        let baseline = Learner::new(
            baseline,
            &self.config.baseline_optimizer,
            self.config.baseline_learning_rate,
            LossKind::Baseline,
        );

        Trainer {
            config: self.config,
            policy: self.policy,
            baseline: Some(baseline),
            device: self.device,
        }
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    pub fn run<E, R>(
        mut self,
        env: &mut E,
        reporter: &mut R,
    ) -> crate::error::Result<Trained<P, V>>
    where
        E: Environment,
        R: Reporter,
    {
        self.config.validate()?;

        let artifact_dir = PathBuf::from(&self.config.artifact_dir);
        checkpoint::prepare_dir(&artifact_dir, self.config.overwrite)?;
        self.config.save(artifact_dir.join("config.json"))?;

        if let Some(seed) = self.config.seed {
            B::seed(seed);
        }

        let mut checkpointer = Checkpointer::new(
            &artifact_dir,
            self.config.checkpoint_every,
            self.config.save_policy,
        );

        let mut episode_buffer = EpisodeBuffer::<B>::new();
        let mut baseline_buffer = BaselineBuffer::<B>::new();
        let mut policy_loss = Accumulator::<B>::new();
        let mut baseline_loss = Accumulator::<B>::new();

        info!(
            "Start training: {} episodes of {} steps, batch {}{}",
            self.config.episodes,
            self.config.horizon,
            self.config.batch,
            if self.baseline.is_some() {
                " with baseline"
            } else {
                ""
            }
        );

        for episode in 0..self.config.episodes {
            env.reset();

            play_episode(
                self.policy.model(),
                self.baseline
                    .as_ref()
                    .map(|baseline| (baseline.model(), &mut baseline_buffer)),
                env,
                self.config.horizon,
                &mut episode_buffer,
                &self.device,
            )?;

            let returns = compute_value_function(&episode_buffer.rewards, self.config.gamma);

            let baseline_values = match self.baseline.take() {
                Some(mut baseline) => {
                    let predictions = baseline_buffer.values()?;
                    let values = to_vec(predictions.clone())?;

                    let loss = compute_baseline_loss(&returns, predictions, &mut baseline.history)?;
                    baseline_loss.push(loss);

                    if !self.config.batch_baseline || baseline_loss.len() == self.config.batch {
                        if let Some(loss) = baseline_loss.take_mean() {
                            baseline = baseline.fit(loss, episode)?;
                        }
                    }

                    self.baseline = Some(baseline);
                    Some(values)
                }
                None => None,
            };

            let loss = compute_loss(
                &episode_buffer,
                &returns,
                baseline_values.as_deref(),
                &mut self.policy.history,
            )?;
            policy_loss.push(loss);

            episode_buffer.reset();
            baseline_buffer.reset();

            if policy_loss.len() == self.config.batch {
                if let Some(loss) = policy_loss.take_mean() {
                    self.policy = self.policy.fit(loss, episode)?;
                }
            }

            checkpointer.maybe_save::<B, P>(self.policy.model(), episode)?;

            if self.config.verbose && episode % self.config.report_every == 0 {
                reporter.report(&Snapshot {
                    episode,
                    policy: &self.policy.history,
                    baseline: self.baseline.as_ref().map(|baseline| &baseline.history),
                    hunter_trajectory: env.hunter_trajectory(),
                    victim_trajectory: env.victim_trajectory(),
                })?;
            }
        }

        let last = self.config.episodes.saturating_sub(1);
        if let Some(loss) = policy_loss.take_mean() {
            info!("Flushing a partial batch of policy losses");
            self.policy = self.policy.fit(loss, last)?;
        }
        if let Some(loss) = baseline_loss.take_mean() {
            if let Some(baseline) = self.baseline.take() {
                self.baseline = Some(baseline.fit(loss, last)?);
            }
        }

        info!(
            "OK training completed: {} policy updates, {} checkpoints.",
            self.policy.updates(),
            checkpointer.saved().len()
        );

        let policy_updates = self.policy.updates();
        let policy_history = self.policy.history.clone();
        let (baseline, baseline_history, baseline_updates) = match self.baseline {
            Some(baseline) => {
                let updates = baseline.updates();
                let history = baseline.history.clone();
                (Some(baseline.into_model()), Some(history), updates)
            }
            None => (None, None, 0),
        };

        Ok(Trained {
            policy: self.policy.into_model(),
            baseline,
            policy_history,
            baseline_history,
            policy_updates,
            baseline_updates,
            checkpoints: checkpointer.into_saved(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use burn::backend::{Autodiff, Candle};
    use tempfile::{TempDir, tempdir};

    use super::*;
    use crate::{
        model::{GaussianPolicy, GaussianPolicyConfig, ValueBaselineConfig},
        training::testing::ConstantEnv,
    };

    type B = Autodiff<Candle>;

    struct Recording(Vec<usize>);

    impl Reporter for Recording {
        fn report(&mut self, snapshot: &Snapshot<'_>) -> crate::error::Result<()> {
            self.0.push(snapshot.episode);
            Ok(())
        }
    }

    fn setup(episodes: usize, horizon: usize) -> (TempDir, TrainingConfig, GaussianPolicy<B>) {
        let dir = tempdir().unwrap();
        let config = TrainingConfig::new(
            dir.path().join("train_models").display().to_string(),
            AdamConfig::new().with_epsilon(1e-8),
            AdamConfig::new(),
        )
        .with_episodes(episodes)
        .with_horizon(horizon)
        .with_verbose(false);

        let policy = GaussianPolicyConfig::new(2, 2)
            .with_hidden_size(8)
            .init::<B>(&Default::default());

        (dir, config, policy)
    }

    fn checkpoint_names(trained: &Trained<impl Sized, impl Sized>) -> Vec<String> {
        trained
            .checkpoints
            .iter()
            .map(|path| path.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn single_episode_end_to_end() {
        let (_dir, config, policy) = setup(1, 1000);
        let artifact_dir = PathBuf::from(&config.artifact_dir);
        let mut env = ConstantEnv::new(1.0);

        let trained = config
            .with_gamma(0.9)
            .with_batch(1)
            .init(policy, Default::default())
            .run(&mut env, &mut ())
            .unwrap();

        assert_eq!(trained.policy_updates, 1);
        assert_eq!(trained.policy_history.rewards, vec![1000.0]);
        assert_eq!(trained.policy_history.losses.len(), 1);
        assert_eq!(checkpoint_names(&trained), vec!["policy_0.mpk"]);
        assert!(artifact_dir.join("policy_0.mpk").exists());
        assert!(artifact_dir.join("config.json").exists());
        assert!(trained.baseline.is_none());
        assert_eq!(env.resets(), 1);
    }

    #[test]
    fn checkpoints_every_hundred_episodes() {
        let (_dir, config, policy) = setup(250, 2);
        let artifact_dir = PathBuf::from(&config.artifact_dir);
        let mut env = ConstantEnv::new(1.0);

        let trained = config
            .with_save_policy(true)
            .init(policy, Default::default())
            .run(&mut env, &mut ())
            .unwrap();

        assert_eq!(
            checkpoint_names(&trained),
            vec!["policy_0.mpk", "policy_100.mpk", "policy_200.mpk"]
        );

        let mut on_disk: Vec<String> = fs::read_dir(&artifact_dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|name| name.starts_with("policy_"))
            .collect();
        on_disk.sort();
        assert_eq!(on_disk, vec!["policy_0.mpk", "policy_100.mpk", "policy_200.mpk"]);
        assert_eq!(trained.policy_updates, 250);
    }

    #[test]
    fn save_policy_off_writes_no_checkpoints() {
        let (_dir, config, policy) = setup(3, 2);
        let trained = config
            .with_save_policy(false)
            .init(policy, Default::default())
            .run(&mut ConstantEnv::new(1.0), &mut ())
            .unwrap();

        assert!(trained.checkpoints.is_empty());
    }

    #[test]
    fn batches_policy_updates_and_flushes_remainder() {
        let (_dir, config, policy) = setup(5, 3);
        let trained = config
            .with_batch(2)
            .init(policy, Default::default())
            .run(&mut ConstantEnv::new(1.0), &mut ())
            .unwrap();

        assert_eq!(trained.policy_updates, 3);
        assert_eq!(trained.policy_history.rewards.len(), 5);
    }

    #[test]
    fn baseline_steps_every_episode_by_default() {
        let (_dir, config, policy) = setup(4, 5);
        let device = Default::default();
        let baseline = ValueBaselineConfig::new(2)
            .with_hidden_size(8)
            .init::<B>(&device);

        let trained = config
            .with_batch(2)
            .init(policy, device)
            .with_baseline(baseline)
            .run(&mut ConstantEnv::new(1.0), &mut ())
            .unwrap();

        assert_eq!(trained.baseline_updates, 4);
        assert_eq!(trained.policy_updates, 2);

        let history = trained.baseline_history.unwrap();
        assert_eq!(history.rewards.len(), 4);
        assert_eq!(history.losses.len(), 4);
        assert!(trained.baseline.is_some());
    }

    #[test]
    fn baseline_can_follow_policy_batches() {
        let (_dir, config, policy) = setup(4, 5);
        let device = Default::default();
        let baseline = ValueBaselineConfig::new(2).init::<B>(&device);

        let trained = config
            .with_batch(2)
            .with_batch_baseline(true)
            .init(policy, device)
            .with_baseline(baseline)
            .run(&mut ConstantEnv::new(1.0), &mut ())
            .unwrap();

        assert_eq!(trained.baseline_updates, 2);
    }

    #[test]
    fn reports_every_ten_episodes_when_verbose() {
        let (_dir, config, policy) = setup(25, 2);
        let mut reporter = Recording(Vec::new());

        config
            .with_verbose(true)
            .init(policy, Default::default())
            .run(&mut ConstantEnv::new(1.0), &mut reporter)
            .unwrap();

        assert_eq!(reporter.0, vec![0, 10, 20]);
    }

    #[test]
    fn quiet_training_never_reports() {
        let (_dir, config, policy) = setup(12, 2);
        let mut reporter = Recording(Vec::new());

        config
            .init(policy, Default::default())
            .run(&mut ConstantEnv::new(1.0), &mut reporter)
            .unwrap();

        assert!(reporter.0.is_empty());
    }

    #[test]
    fn refuses_occupied_artifact_dir() {
        let (_dir, config, policy) = setup(1, 2);
        fs::create_dir_all(&config.artifact_dir).unwrap();
        fs::write(PathBuf::from(&config.artifact_dir).join("policy_0.mpk"), b"keep").unwrap();

        let result = config
            .init(policy, Default::default())
            .run(&mut ConstantEnv::new(1.0), &mut ());

        assert!(matches!(result, Err(TrainError::CheckpointDirNotEmpty(_))));
    }

    #[test]
    fn rejects_invalid_config() {
        let (_dir, config, policy) = setup(1, 2);

        let result = config
            .with_batch(0)
            .init(policy, Default::default())
            .run(&mut ConstantEnv::new(1.0), &mut ());

        assert!(matches!(result, Err(TrainError::InvalidConfig(_))));
    }

    #[test]
    fn saved_config_describes_unseeded_run() {
        let (_dir, config, policy) = setup(1, 2);
        let artifact_dir = PathBuf::from(&config.artifact_dir);
        assert!(config.seed.is_none());

        config
            .init(policy, Default::default())
            .run(&mut ConstantEnv::new(1.0), &mut ())
            .unwrap();

        let saved = TrainingConfig::load(artifact_dir.join("config.json")).unwrap();
        assert_eq!(saved.seed, None);
        assert_eq!(saved.episodes, 1);
    }

    #[test]
    fn config_validation() {
        let (_dir, config, _) = setup(1, 1);

        assert!(config.validate().is_ok());
        assert!(config.clone().with_gamma(1.5).validate().is_err());
        assert!(config.clone().with_gamma(0.0).validate().is_ok());
        assert!(config.clone().with_horizon(0).validate().is_err());
        assert!(config.clone().with_report_every(0).validate().is_err());
        assert!(config.with_learning_rate(0.0).validate().is_err());
    }
}
