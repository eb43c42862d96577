pub mod config;
pub mod env;
pub mod error;
pub mod model;
pub mod training;

pub use error::{Result, TrainError};
