use std::{
    fs,
    path::{Path, PathBuf},
};

use burn::{
    module::Module,
    prelude::Backend,
    record::{CompactRecorder, Recorder},
};
use log::{info, warn};

use crate::error::{Result, TrainError};

/// Prepares `dir` for a fresh run.
///
/// A missing or empty directory is created. A non-empty one is only wiped when
/// `overwrite` is set.
pub fn prepare_dir(dir: &Path, overwrite: bool) -> Result<()> {
    if dir.exists() {
        let occupied = fs::read_dir(dir)?.next().is_some();

        if occupied && !overwrite {
            return Err(TrainError::CheckpointDirNotEmpty(dir.to_path_buf()));
        }

        if occupied {
            warn!("Removing previous artifacts in {}", dir.display());
            fs::remove_dir_all(dir)?;
        }
    }

    fs::create_dir_all(dir)?;

    Ok(())
}

/// Writes a policy snapshot every `every` episodes.
#[derive(Clone, Debug)]
pub struct Checkpointer {
    dir: PathBuf,
    every: usize,
    enabled: bool,
    saved: Vec<PathBuf>,
}

impl Checkpointer {
    pub fn new(dir: impl Into<PathBuf>, every: usize, enabled: bool) -> Self {
        Self {
            dir: dir.into(),
            every,
            enabled,
            saved: Vec::new(),
        }
    }

    pub fn path(&self, episode: usize) -> PathBuf {
        self.dir.join(format!("policy_{episode}.mpk"))
    }

    pub fn due(&self, episode: usize) -> bool {
        self.enabled && self.every > 0 && episode % self.every == 0
    }

    pub fn maybe_save<B, M>(&mut self, model: &M, episode: usize) -> Result<Option<PathBuf>>
    where
        B: Backend,
        M: Module<B>,
    {
        if !self.due(episode) {
            return Ok(None);
        }

        let path = self.path(episode);
        model.clone().save_file(path.clone(), &CompactRecorder::new())?;
        info!("Saved policy checkpoint {}", path.display());

        self.saved.push(path.clone());

        Ok(Some(path))
    }

    pub fn saved(&self) -> &[PathBuf] {
        &self.saved
    }

    pub fn into_saved(self) -> Vec<PathBuf> {
        self.saved
    }
}

/// Restores a saved record into a freshly initialized `model`.
pub fn load<B, M>(model: M, path: &Path, device: &B::Device) -> Result<M>
where
    B: Backend,
    M: Module<B>,
{
    let record = Recorder::<B>::load(&CompactRecorder::new(), path.to_path_buf(), device)?;

    Ok(model.load_record(record))
}
