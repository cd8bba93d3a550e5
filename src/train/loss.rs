//! Loss functions

use crate::autograd::{BackwardOp, Tensor};
use ndarray::Array1;
use std::cell::RefCell;
use std::rc::Rc;

/// Trait for loss functions.
pub trait LossFn {
    /// Compute the scalar loss for predictions against targets, recording
    /// the gradient on the tape when predictions require it.
    fn forward(&self, predictions: &Tensor, targets: &Tensor) -> Tensor;

    /// Name of the loss function.
    fn name(&self) -> &'static str;
}

/// Mean binary cross-entropy over probabilities.
///
/// Predictions are probabilities in [0, 1]; targets are 0/1 labels. Inputs
/// are clamped away from 0 and 1 so the logs stay finite:
///
/// ```text
/// L = -mean(t * ln(p) + (1 - t) * ln(1 - p))
/// ```
///
/// Gradient: `∂L/∂p_i = (p_i - t_i) / (p_i (1 - p_i) N)`.
///
/// The loss is non-negative for all inputs and reaches 0 only in the
/// degenerate case where every clamped prediction equals its label exactly.
pub struct BCELoss;

const EPS: f32 = 1e-7;

impl BCELoss {
    fn clamp(p: f32) -> f32 {
        p.clamp(EPS, 1.0 - EPS)
    }
}

impl LossFn for BCELoss {
    fn forward(&self, predictions: &Tensor, targets: &Tensor) -> Tensor {
        assert_eq!(
            predictions.len(),
            targets.len(),
            "predictions and targets must have the same length"
        );

        let n = predictions.len() as f32;
        let total: f32 = predictions
            .data()
            .iter()
            .zip(targets.data().iter())
            .map(|(&p, &t)| {
                let p = Self::clamp(p);
                -(t * p.ln() + (1.0 - t) * (1.0 - p).ln())
            })
            .sum::<f32>()
            / n;

        let mut loss = Tensor::from_vec(vec![total], predictions.requires_grad());

        if predictions.requires_grad() {
            let grad: Array1<f32> = predictions
                .data()
                .iter()
                .zip(targets.data().iter())
                .map(|(&p, &t)| {
                    let p = Self::clamp(p);
                    (p - t) / (p * (1.0 - p) * n)
                })
                .collect();

            loss.set_backward_op(Rc::new(BCEBackward {
                pred: predictions.clone(),
                grad,
                result_grad: loss.grad_cell(),
            }));
        }

        loss
    }

    fn name(&self) -> &'static str {
        "BCE"
    }
}

struct BCEBackward {
    pred: Tensor,
    grad: Array1<f32>,
    result_grad: Rc<RefCell<Option<Array1<f32>>>>,
}

impl BackwardOp for BCEBackward {
    fn backward(&self) {
        if let Some(out_grad) = self.result_grad.borrow().as_ref() {
            self.pred.accumulate_grad(&self.grad * out_grad[0]);

            if let Some(op) = self.pred.backward_op() {
                op.backward();
            }
        }
    }
}
