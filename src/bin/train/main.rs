use std::path::Path;

use anyhow::{Context, Result};
use arena::PursuitEnv;
use burn::{
    backend::{
        Autodiff, Candle, Wgpu,
        candle::CandleDevice,
        wgpu::WgpuDevice,
    },
    tensor::backend::AutodiffBackend,
};
use log::info;
use num_format::{Locale, ToFormattedString};
use pursuit::{
    config::{self, BackendKind, Config, ReporterKind},
    env::Environment,
    model::{GaussianPolicyConfig, ValueBaselineConfig},
    training::{ConsoleReporter, JsonReporter, Reporter, Trained, TuiReporter, checkpoint},
};

mod arena;

fn main() -> Result<()> {
    env_logger::init();

    let filename = std::env::args()
        .nth(1)
        .unwrap_or_else(|| String::from("config.toml"));
    let config = config::load(&filename)?;

    let seed = backend_seed(config.backend, config.training.seed);

    match config.backend {
        BackendKind::Candle => run::<Autodiff<Candle>>(config, CandleDevice::default(), seed),
        BackendKind::Wgpu => run::<Autodiff<Wgpu>>(config, WgpuDevice::default(), seed),
    }
}

/// Candle has no manual seeding, so candle runs are not reproducible.
fn backend_seed(backend: BackendKind, seed: u64) -> Option<u64> {
    match backend {
        BackendKind::Candle => None,
        BackendKind::Wgpu => Some(seed),
    }
}

fn run<B: AutodiffBackend>(config: Config, device: B::Device, seed: Option<u64>) -> Result<()> {
    if let Some(seed) = seed {
        B::seed(seed);
    }

    let mut env = PursuitEnv::new(config.arena.clone(), config.training.seed);

    let policy = GaussianPolicyConfig::new(env.observation_size(), env.action_size())
        .with_hidden_size(config.model.hidden_size)
        .init::<B>(&device);
    let policy = match &config.resume_from {
        Some(path) => {
            info!("Resuming from {path}");
            checkpoint::load(policy, Path::new(path), &device)
                .with_context(|| format!("loading policy checkpoint {path}"))?
        }
        None => policy,
    };

    let mut reporters: Vec<Box<dyn Reporter>> = Vec::new();
    let mut tui = None;
    for kind in &config.report.reporters {
        match kind {
            ReporterKind::Console => reporters.push(Box::new(ConsoleReporter::new())),
            ReporterKind::Json => {
                reporters.push(Box::new(JsonReporter::new(&config.report.json_dir)))
            }
            ReporterKind::Tui => tui = Some(TuiReporter::new(config.training.episodes)),
        }
    }
    let mut reporter = (reporters, tui);

    let trainer = config
        .training
        .to_config()
        .with_seed(seed)
        .init(policy, device.clone());

    let result = if config.model.baseline {
        let baseline = ValueBaselineConfig::new(env.observation_size())
            .with_hidden_size(config.model.baseline_hidden_size)
            .init::<B>(&device);

        trainer
            .with_baseline(baseline)
            .run(&mut env, &mut reporter)
            .map(|trained| print_summary(&trained))
    } else {
        trainer
            .run(&mut env, &mut reporter)
            .map(|trained| print_summary(&trained))
    };

    let (_, tui) = reporter;
    if let Some(tui) = tui {
        tui.join();
    }

    result.context("training failed")?;
    println!(
        "Captures: {}",
        env.captures().to_formatted_string(&Locale::en)
    );

    Ok(())
}

fn print_summary<P, V>(trained: &Trained<P, V>) {
    let rewards = &trained.policy_history.rewards;
    let recent = &rewards[rewards.len().saturating_sub(10)..];

    println!("-- Summary");
    println!(
        "Episodes: {}",
        rewards.len().to_formatted_string(&Locale::en)
    );
    println!(
        "Policy updates: {}",
        trained.policy_updates.to_formatted_string(&Locale::en)
    );
    if trained.baseline.is_some() {
        println!(
            "Baseline updates: {}",
            trained.baseline_updates.to_formatted_string(&Locale::en)
        );
    }
    if !recent.is_empty() {
        println!(
            "Mean reward (last {}): {:.2}",
            recent.len(),
            recent.iter().sum::<f32>() / recent.len() as f32
        );
    }
    for path in &trained.checkpoints {
        println!("Checkpoint: {}", path.display());
    }
}
