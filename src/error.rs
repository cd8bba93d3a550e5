//! Crate-wide error type

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the training and evaluation loops.
#[derive(Debug, Error)]
pub enum Error {
    /// A checkpoint path was given but no file exists there. Fatal to the
    /// operation (training resume or evaluation) that requested the load.
    #[error("no checkpoint found at '{0}'")]
    CheckpointNotFound(PathBuf),

    /// Checkpoint serialization or deserialization failed.
    #[error("checkpoint serialization failed: {0}")]
    Serialization(String),

    /// A checkpoint's state dict does not match the model's parameters.
    #[error("state dict mismatch: {0}")]
    StateDict(String),

    /// The requested device is not available to the numeric engine.
    #[error("device not available: {0}")]
    Device(String),

    /// A data loader could not produce the requested batch or episode.
    #[error("data loader: {0}")]
    Data(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
