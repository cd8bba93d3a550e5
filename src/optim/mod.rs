//! Optimizers and learning-rate schedules

mod adamw;
mod optimizer;
mod scheduler;
mod sgd;

pub use adamw::AdamW;
pub use optimizer::Optimizer;
pub use scheduler::{LRScheduler, StepDecayLR};
pub use sgd::SGD;
