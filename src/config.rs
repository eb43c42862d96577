use std::fs;

use anyhow::{Context, Result};
use burn::optim::AdamConfig;
use serde::{Deserialize, Serialize};

use crate::training::TrainingConfig;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Candle,
    Wgpu,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReporterKind {
    Console,
    Json,
    Tui,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Training {
    pub artifact_dir: String,
    pub episodes: usize,
    pub horizon: usize,
    pub gamma: f32,
    pub batch: usize,
    #[serde(default)]
    pub batch_baseline: bool,
    pub learning_rate: f64,
    pub baseline_learning_rate: f64,
    pub save_policy: bool,
    pub checkpoint_every: usize,
    pub report_every: usize,
    pub verbose: bool,
    #[serde(default)]
    pub overwrite: bool,
    /// seeds the arena, and the backend when it supports manual seeding
    pub seed: u64,
    #[serde(default = "default_beta_1")]
    pub beta_1: f32,
    #[serde(default = "default_beta_2")]
    pub beta_2: f32,
    #[serde(default = "default_epsilon")]
    pub epsilon: f32,
}

fn default_beta_1() -> f32 {
    0.9
}

fn default_beta_2() -> f32 {
    0.999
}

fn default_epsilon() -> f32 {
    1e-8
}

impl Training {
    pub fn optimizer(&self) -> AdamConfig {
        AdamConfig::new()
            .with_beta_1(self.beta_1)
            .with_beta_2(self.beta_2)
            .with_epsilon(self.epsilon)
    }

    /// The backend seed is left unset; callers on a seedable backend add it
    /// with `with_seed`.
    pub fn to_config(&self) -> TrainingConfig {
        TrainingConfig::new(
            self.artifact_dir.clone(),
            self.optimizer(),
            self.optimizer(),
        )
        .with_episodes(self.episodes)
        .with_horizon(self.horizon)
        .with_gamma(self.gamma)
        .with_batch(self.batch)
        .with_batch_baseline(self.batch_baseline)
        .with_learning_rate(self.learning_rate)
        .with_baseline_learning_rate(self.baseline_learning_rate)
        .with_save_policy(self.save_policy)
        .with_checkpoint_every(self.checkpoint_every)
        .with_report_every(self.report_every)
        .with_verbose(self.verbose)
        .with_overwrite(self.overwrite)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Model {
    pub hidden_size: usize,
    pub baseline: bool,
    pub baseline_hidden_size: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Arena {
    pub size: f32,
    pub hunter_speed: f32,
    pub victim_speed: f32,
    pub capture_radius: f32,
    pub capture_bonus: f32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Report {
    pub reporters: Vec<ReporterKind>,
    pub json_dir: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    pub backend: BackendKind,
    /// policy checkpoint to start from instead of a fresh network
    pub resume_from: Option<String>,
    pub training: Training,
    pub model: Model,
    pub arena: Arena,
    pub report: Report,
}

pub fn load(filename: &str) -> Result<Config> {
    let contents =
        fs::read_to_string(filename).with_context(|| format!("reading run file {filename}"))?;
    let config: Config =
        toml::from_str(&contents).with_context(|| format!("parsing run file {filename}"))?;

    Ok(config)
}
