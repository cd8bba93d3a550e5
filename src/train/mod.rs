//! Training and evaluation loops
//!
//! The [`Framework`] pulls batches from a training loader, drives the
//! model's forward/backward passes and one optimizer step per iteration,
//! validates on a cadence, keeps the single best checkpoint, and finishes
//! with a test pass against that checkpoint.

mod checkpoint;
mod config;
mod framework;
mod loss;
mod metrics;
mod progress;

pub use checkpoint::Checkpoint;
pub use config::{EvalConfig, OptimizerKind, TrainConfig};
pub use framework::Framework;
pub use loss::{BCELoss, LossFn};
pub use metrics::{Accuracy, Metric, RunningAverage};
