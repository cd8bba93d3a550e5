//! Tape-based autograd engine
//!
//! A deliberately small engine: flat f32 tensors, a gradient tape built from
//! [`BackwardOp`] closures, and the handful of ops a linear few-shot scorer
//! needs. The harness treats it as the host numeric library; everything
//! numerically significant lives here, everything else is orchestration.

mod device;
pub mod ops;
mod tensor;

pub use device::Device;
pub use tensor::{BackwardOp, Tensor};

/// Perform a backward pass starting from a scalar loss tensor.
///
/// Seeds the gradient with ones (the convention for a scalar loss) and walks
/// the tape recorded during the forward pass.
pub fn backward(tensor: &Tensor) {
    let ones = ndarray::Array1::ones(tensor.len());
    tensor.set_grad(ones);

    if let Some(op) = tensor.backward_op() {
        op.backward();
    }
}
