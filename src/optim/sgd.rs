//! Stochastic Gradient Descent optimizer

use super::Optimizer;
use crate::Tensor;
use ndarray::Array1;

/// SGD with optional momentum and L2 weight decay.
///
/// Update rule (momentum > 0):
/// ```text
/// g_t = grad + weight_decay * θ
/// v_t = momentum * v_{t-1} + g_t
/// θ_t = θ_{t-1} - lr * v_t
/// ```
pub struct SGD {
    lr: f32,
    momentum: f32,
    weight_decay: f32,
    velocities: Vec<Option<Array1<f32>>>,
}

impl SGD {
    /// Create a new SGD optimizer.
    pub fn new(lr: f32, momentum: f32, weight_decay: f32) -> Self {
        Self {
            lr,
            momentum,
            weight_decay,
            velocities: Vec::new(),
        }
    }

    /// Plain SGD without momentum.
    pub fn plain(lr: f32, weight_decay: f32) -> Self {
        Self::new(lr, 0.0, weight_decay)
    }

    fn ensure_velocities(&mut self, params: &[Tensor]) {
        if self.velocities.len() != params.len() {
            self.velocities = params.iter().map(|_| None).collect();
        }
    }
}

impl Optimizer for SGD {
    fn step(&mut self, params: &[Tensor]) {
        self.ensure_velocities(params);

        for (i, param) in params.iter().enumerate() {
            let Some(grad) = param.grad() else { continue };

            let mut g = grad;
            if self.weight_decay > 0.0 {
                g = g + param.data() * self.weight_decay;
            }

            let update = if self.momentum > 0.0 {
                let v = match self.velocities[i].take() {
                    Some(prev) => prev * self.momentum + &g,
                    None => g,
                };
                self.velocities[i] = Some(v.clone());
                v
            } else {
                g
            };

            param.set_data(param.data() - update * self.lr);
        }
    }

    fn lr(&self) -> f32 {
        self.lr
    }

    fn set_lr(&mut self, lr: f32) {
        self.lr = lr;
    }
}
