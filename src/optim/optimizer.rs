//! Optimizer trait

use crate::Tensor;

/// Trait for optimization algorithms.
///
/// Parameters are shared tensor handles; `step` writes updated values back
/// through them so every holder of the handle observes the update.
pub trait Optimizer {
    /// Perform a single optimization step over the given parameters.
    fn step(&mut self, params: &[Tensor]);

    /// Clear gradients on all parameters.
    fn zero_grad(&mut self, params: &[Tensor]) {
        for param in params {
            param.zero_grad();
        }
    }

    /// Get the current learning rate.
    fn lr(&self) -> f32;

    /// Set the learning rate. Schedulers drive this between steps.
    fn set_lr(&mut self, lr: f32);
}
