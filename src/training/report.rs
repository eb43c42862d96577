use std::{
    fs::File,
    io::{self, BufWriter, Stdout, Write},
    path::{Path, PathBuf},
};

use serde::Serialize;

use super::episode::History;
use crate::{env::Point, error::Result};

/// Plain training data handed to reporters; no live models or environments.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct Snapshot<'a> {
    pub episode: usize,
    pub policy: &'a History,
    pub baseline: Option<&'a History>,
    pub hunter_trajectory: &'a [Point],
    pub victim_trajectory: &'a [Point],
}

impl Snapshot<'_> {
    pub fn last_reward(&self) -> Option<f32> {
        self.policy.rewards.last().copied()
    }

    pub fn last_baseline_reward(&self) -> Option<f32> {
        self.baseline.and_then(|history| history.rewards.last().copied())
    }
}

/// Receives a snapshot every few episodes while training is verbose.
pub trait Reporter {
    fn report(&mut self, snapshot: &Snapshot<'_>) -> Result<()>;
}

impl Reporter for () {
    fn report(&mut self, _snapshot: &Snapshot<'_>) -> Result<()> {
        Ok(())
    }
}

impl<R: Reporter + ?Sized> Reporter for &mut R {
    fn report(&mut self, snapshot: &Snapshot<'_>) -> Result<()> {
        (**self).report(snapshot)
    }
}

impl<R: Reporter + ?Sized> Reporter for Box<R> {
    fn report(&mut self, snapshot: &Snapshot<'_>) -> Result<()> {
        (**self).report(snapshot)
    }
}

impl<R: Reporter> Reporter for Option<R> {
    fn report(&mut self, snapshot: &Snapshot<'_>) -> Result<()> {
        match self {
            Some(reporter) => reporter.report(snapshot),
            None => Ok(()),
        }
    }
}

impl<R: Reporter> Reporter for Vec<R> {
    fn report(&mut self, snapshot: &Snapshot<'_>) -> Result<()> {
        self.iter_mut()
            .try_for_each(|reporter| reporter.report(snapshot))
    }
}

impl<A: Reporter, B: Reporter> Reporter for (A, B) {
    fn report(&mut self, snapshot: &Snapshot<'_>) -> Result<()> {
        self.0.report(snapshot)?;
        self.1.report(snapshot)
    }
}

/// Prints the latest episode rewards, to stdout unless another writer is given.
#[derive(Debug)]
pub struct ConsoleReporter<W: Write = Stdout> {
    out: W,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self::with_writer(io::stdout())
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub fn with_writer(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Reporter for ConsoleReporter<W> {
    fn report(&mut self, snapshot: &Snapshot<'_>) -> Result<()> {
        if let Some(reward) = snapshot.last_reward() {
            writeln!(
                self.out,
                "Episode {} \tLast reward: {:.2}",
                snapshot.episode, reward
            )?;
        }

        if let Some(reward) = snapshot.last_baseline_reward() {
            writeln!(self.out, "Last reward: {:.2}", reward)?;
        }

        Ok(())
    }
}

/// Writes each snapshot to `<dir>/report_<episode>.json` for offline plotting.
#[derive(Clone, Debug)]
pub struct JsonReporter {
    dir: PathBuf,
}

impl JsonReporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self, episode: usize) -> PathBuf {
        self.dir.join(format!("report_{episode}.json"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl Reporter for JsonReporter {
    fn report(&mut self, snapshot: &Snapshot<'_>) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;

        let file = File::create(self.path(snapshot.episode))?;
        serde_json::to_writer_pretty(BufWriter::new(file), snapshot)?;

        Ok(())
    }
}
