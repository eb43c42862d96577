pub mod checkpoint;
pub mod episode;
pub mod learner;
pub mod loss;
pub mod render;
pub mod report;
pub mod returns;
pub mod training;

#[cfg(test)]
mod testing;

pub use episode::History;
pub use render::TuiReporter;
pub use report::{ConsoleReporter, JsonReporter, Reporter, Snapshot};
pub use training::{Trained, Trainer, TrainingConfig};
