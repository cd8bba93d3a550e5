//! relatar — a thin training/evaluation harness for few-shot
//! relation-extraction models.
//!
//! The crate is mostly glue: a gradient-descent training loop, a
//! checkpoint-based evaluation loop, and the [`FewShotModel`] contract a
//! concrete model implements. Numeric work runs on a compact tape-based
//! autograd engine ([`autograd`]).
//!
//! # Example
//!
//! ```no_run
//! use relatar::{Framework, TrainConfig};
//! # use relatar::{Batch, DataLoader, Episode, FewShotModel, Result, Tensor};
//! # struct Loader;
//! # impl DataLoader for Loader {
//! #     fn next_batch(&mut self, _: usize) -> Result<Batch> { unimplemented!() }
//! #     fn next_new_relation(&mut self, _: &mut Self, _: usize, _: usize, _: usize)
//! #         -> Result<Episode> { unimplemented!() }
//! # }
//! # struct Model { w: Tensor }
//! # impl FewShotModel for Model {
//! #     fn forward_base(&mut self, _: &Batch) -> Result<()> { unimplemented!() }
//! #     fn forward_new(&mut self, _: &Episode) -> Result<()> { unimplemented!() }
//! #     fn loss(&self) -> Tensor { unimplemented!() }
//! #     fn accuracy(&self) -> f32 { unimplemented!() }
//! #     fn parameters(&self) -> Vec<Tensor> { vec![self.w.clone()] }
//! #     fn state_dict(&self) -> Vec<(String, Tensor)> { vec![] }
//! # }
//! let mut framework = Framework::new(Loader, Loader, Loader);
//! let mut model = Model { w: Tensor::zeros(8, true) };
//! let config = TrainConfig::new("proto").train_iter(30_000).val_step(2_000);
//! let test_acc = framework.train(&mut model, &config)?;
//! println!("test accuracy: {test_acc:.4}");
//! # Ok::<(), relatar::Error>(())
//! ```

pub mod autograd;
pub mod data;
mod error;
pub mod model;
pub mod optim;
pub mod train;

pub use autograd::{backward, Device, Tensor};
pub use data::{Batch, DataLoader, Episode};
pub use error::{Error, Result};
pub use model::FewShotModel;
pub use train::{
    Accuracy, BCELoss, Checkpoint, EvalConfig, Framework, LossFn, Metric, OptimizerKind,
    RunningAverage, TrainConfig,
};
