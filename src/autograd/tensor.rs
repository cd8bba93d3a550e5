//! Shared-handle tensor with an optional gradient buffer

use ndarray::Array1;
use std::cell::RefCell;
use std::rc::Rc;

/// A node on the gradient tape. Ops that participate in backpropagation
/// record one of these on their output tensor.
pub trait BackwardOp {
    /// Propagate the output gradient to the op's inputs.
    fn backward(&self);
}

/// A flat f32 tensor.
///
/// `Tensor` is a cheap-clone handle: clones share the same storage and
/// gradient buffer, so a model, the optimizer, and a checkpoint writer can
/// all hold the same parameter. The engine is single-threaded by design and
/// the handle is deliberately not `Send`.
#[derive(Clone)]
pub struct Tensor {
    data: Rc<RefCell<Array1<f32>>>,
    grad: Rc<RefCell<Option<Array1<f32>>>>,
    requires_grad: bool,
    backward_op: Rc<RefCell<Option<Rc<dyn BackwardOp>>>>,
}

impl Tensor {
    /// Create a tensor from an ndarray.
    pub fn new(data: Array1<f32>, requires_grad: bool) -> Self {
        Self {
            data: Rc::new(RefCell::new(data)),
            grad: Rc::new(RefCell::new(None)),
            requires_grad,
            backward_op: Rc::new(RefCell::new(None)),
        }
    }

    /// Create a tensor from a plain vector.
    pub fn from_vec(data: Vec<f32>, requires_grad: bool) -> Self {
        Self::new(Array1::from(data), requires_grad)
    }

    /// Create a zero-filled tensor.
    pub fn zeros(len: usize, requires_grad: bool) -> Self {
        Self::new(Array1::zeros(len), requires_grad)
    }

    pub fn len(&self) -> usize {
        self.data.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.borrow().is_empty()
    }

    /// Copy of the underlying data.
    pub fn data(&self) -> Array1<f32> {
        self.data.borrow().clone()
    }

    /// Replace the underlying data in place. All handles observe the new
    /// values; the optimizer uses this to apply parameter updates.
    pub fn set_data(&self, data: Array1<f32>) {
        *self.data.borrow_mut() = data;
    }

    /// Extract the scalar value of a one-element tensor.
    ///
    /// The single result-extraction accessor: loss and accuracy scalars come
    /// out through here and nowhere else.
    pub fn item(&self) -> f32 {
        self.data.borrow()[0]
    }

    pub fn requires_grad(&self) -> bool {
        self.requires_grad
    }

    /// Copy of the current gradient, if one has been accumulated.
    pub fn grad(&self) -> Option<Array1<f32>> {
        self.grad.borrow().clone()
    }

    /// The shared gradient cell, for ops that accumulate into it lazily.
    pub fn grad_cell(&self) -> Rc<RefCell<Option<Array1<f32>>>> {
        Rc::clone(&self.grad)
    }

    pub fn set_grad(&self, grad: Array1<f32>) {
        *self.grad.borrow_mut() = Some(grad);
    }

    /// Add `grad` into the gradient buffer, initializing it if empty.
    pub fn accumulate_grad(&self, grad: Array1<f32>) {
        let mut cell = self.grad.borrow_mut();
        match cell.as_mut() {
            Some(existing) => *existing = &*existing + &grad,
            None => *cell = Some(grad),
        }
    }

    /// Clear the gradient buffer.
    pub fn zero_grad(&self) {
        *self.grad.borrow_mut() = None;
    }

    pub fn set_backward_op(&mut self, op: Rc<dyn BackwardOp>) {
        *self.backward_op.borrow_mut() = Some(op);
    }

    pub fn backward_op(&self) -> Option<Rc<dyn BackwardOp>> {
        self.backward_op.borrow().clone()
    }
}

impl std::fmt::Debug for Tensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tensor")
            .field("data", &self.data.borrow())
            .field("requires_grad", &self.requires_grad)
            .field("has_grad", &self.grad.borrow().is_some())
            .finish()
    }
}
