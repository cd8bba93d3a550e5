//! The few-shot model contract

use crate::autograd::Device;
use crate::data::{Batch, Episode};
use crate::error::{Error, Result};
use crate::train::{Accuracy, BCELoss, LossFn, Metric};
use crate::Tensor;

/// Contract for a few-shot classification model.
///
/// A concrete model wraps a sentence/instance encoder and implements the two
/// forward passes; the training framework drives everything else. The
/// abstract-method contract of the original design is enforced statically:
/// a type without `forward_base`/`forward_new` does not compile.
///
/// A forward pass is expected to leave the most recent scalar loss and
/// accuracy behind, retrievable through [`loss`](FewShotModel::loss) and
/// [`accuracy`](FewShotModel::accuracy). Calling the accessors before any
/// forward pass returns whatever the model initialized them to.
pub trait FewShotModel {
    /// Consume one training batch, updating the stored loss and accuracy.
    fn forward_base(&mut self, batch: &Batch) -> Result<()>;

    /// Consume one support/query episode, updating the stored loss and
    /// accuracy.
    fn forward_new(&mut self, episode: &Episode) -> Result<()>;

    /// The loss computed by the most recent forward pass, as a scalar tensor
    /// still attached to the tape so the framework can backpropagate it.
    fn loss(&self) -> Tensor;

    /// The accuracy computed by the most recent forward pass, in [0, 1].
    fn accuracy(&self) -> f32;

    /// All parameter handles, trainable or not.
    fn parameters(&self) -> Vec<Tensor>;

    /// Named parameter handles, in a stable order, for checkpointing.
    fn state_dict(&self) -> Vec<(String, Tensor)>;

    /// Default loss: mean binary cross-entropy over the flattened
    /// prediction and label vectors. Overridable.
    fn compute_loss(&self, predictions: &Tensor, labels: &Tensor) -> Tensor {
        BCELoss.forward(predictions, labels)
    }

    /// Default accuracy: fraction of elementwise-equal prediction/label
    /// pairs. Predictions are compared as-is; any thresholding or rounding
    /// policy belongs to the concrete model. Overridable.
    fn compute_accuracy(&self, predictions: &Tensor, labels: &Tensor) -> f32 {
        Accuracy::exact().compute(predictions, labels)
    }

    /// Restore parameter values from a checkpoint's state dict.
    ///
    /// Writes through the shared handles returned by
    /// [`state_dict`](FewShotModel::state_dict); errors on an unknown
    /// parameter name or a length mismatch.
    fn load_state_dict(&mut self, state: &[(String, Vec<f32>)]) -> Result<()> {
        let params = self.state_dict();
        for (name, values) in state {
            let param = params
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, t)| t)
                .ok_or_else(|| Error::StateDict(format!("unknown parameter '{name}'")))?;
            if param.len() != values.len() {
                return Err(Error::StateDict(format!(
                    "parameter '{name}' has {} elements, checkpoint has {}",
                    param.len(),
                    values.len()
                )));
            }
            param.set_data(ndarray::Array1::from(values.clone()));
        }
        Ok(())
    }

    /// Move model state to the given device.
    ///
    /// The built-in engine is CPU-only; models backed by it keep the default,
    /// which rejects anything else.
    fn to_device(&mut self, device: Device) -> Result<()> {
        match device {
            Device::Cpu => Ok(()),
            other => Err(Error::Device(format!(
                "model does not support device '{other}'"
            ))),
        }
    }
}
