//! Learning rate schedules

use super::Optimizer;

/// Learning rate scheduler trait.
pub trait LRScheduler {
    /// Learning rate for the current step.
    fn get_lr(&self) -> f32;

    /// Advance the schedule by one step.
    fn step(&mut self);

    /// Push the current learning rate into an optimizer.
    fn apply(&self, optimizer: &mut dyn Optimizer) {
        optimizer.set_lr(self.get_lr());
    }
}

/// Step decay: multiply the learning rate by `gamma` every `step_size` steps.
///
/// Formula: `lr_t = lr_initial * gamma^(floor(t / step_size))`
pub struct StepDecayLR {
    lr_initial: f32,
    gamma: f32,
    step_size: usize,
    current_step: usize,
}

impl StepDecayLR {
    /// Create a new step decay scheduler.
    pub fn new(lr_initial: f32, step_size: usize, gamma: f32) -> Self {
        Self {
            lr_initial,
            gamma,
            step_size: step_size.max(1),
            current_step: 0,
        }
    }
}

impl LRScheduler for StepDecayLR {
    fn get_lr(&self) -> f32 {
        let decays = (self.current_step / self.step_size) as i32;
        self.lr_initial * self.gamma.powi(decays)
    }

    fn step(&mut self) {
        self.current_step += 1;
    }
}
