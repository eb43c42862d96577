use std::path::PathBuf;

use burn::record::RecorderError;

/// Which learner produced a loss.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LossKind {
    Policy,
    Baseline,
}

impl std::fmt::Display for LossKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LossKind::Policy => write!(f, "policy"),
            LossKind::Baseline => write!(f, "baseline"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TrainError {
    #[error("episode has no steps")]
    EmptyEpisode,

    #[error("length mismatch: {what} has {found} entries, expected {expected}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("non-finite {kind} loss ({value}) at episode {episode}")]
    NonFiniteLoss {
        kind: LossKind,
        episode: usize,
        value: f32,
    },

    #[error("invalid training config: {0}")]
    InvalidConfig(String),

    #[error("checkpoint directory {0:?} is not empty, set `overwrite` to replace it")]
    CheckpointDirNotEmpty(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("recorder error: {0}")]
    Recorder(#[from] RecorderError),

    #[error("report error: {0}")]
    Report(#[from] serde_json::Error),

    #[error("tensor data error: {0}")]
    TensorData(String),
}

pub type Result<T> = core::result::Result<T, TrainError>;
