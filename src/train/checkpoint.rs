//! Checkpoint persistence

use crate::error::{Error, Result};
use crate::model::FewShotModel;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// A persisted snapshot of model parameters plus the iteration at which it
/// was captured.
///
/// Serialized as JSON. Saves are whole-file overwrites, so at most one
/// checkpoint exists per model name; concurrent runs sharing a model name
/// and checkpoint directory will race destructively on this file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Named parameter values, in the model's `state_dict` order.
    pub state_dict: Vec<(String, Vec<f32>)>,
    /// Training iteration at which the snapshot was taken.
    pub iter: u64,
}

impl Checkpoint {
    /// Snapshot a model's parameter state at the given iteration.
    pub fn from_model<M: FewShotModel>(model: &M, iter: u64) -> Self {
        let state_dict = model
            .state_dict()
            .into_iter()
            .map(|(name, tensor)| (name, tensor.data().to_vec()))
            .collect();
        Self { state_dict, iter }
    }

    /// Write the checkpoint to `path`, creating the parent directory if
    /// absent and overwriting any previous file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        let data = serde_json::to_string(self)
            .map_err(|e| Error::Serialization(format!("checkpoint encode failed: {e}")))?;
        fs::write(path, data)?;
        Ok(())
    }

    /// Load a checkpoint from `path`.
    ///
    /// A missing file is a fatal [`Error::CheckpointNotFound`]; the caller
    /// is expected to abort the operation that requested the load.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::CheckpointNotFound(path.to_path_buf()));
        }

        let data = fs::read_to_string(path)?;
        serde_json::from_str(&data)
            .map_err(|e| Error::Serialization(format!("checkpoint decode failed: {e}")))
    }

    /// Restore a model's parameters from this checkpoint.
    pub fn restore<M: FewShotModel>(&self, model: &mut M) -> Result<()> {
        model.load_state_dict(&self.state_dict)
    }
}
