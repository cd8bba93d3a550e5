//! Batches, episodes, and the data loader contract

use crate::{Result, Tensor};

/// A training batch: instance inputs and their labels.
///
/// Batches are ephemeral: one training or evaluation step consumes a batch
/// and nothing retains it afterwards.
#[derive(Clone)]
pub struct Batch {
    /// Encoded instance inputs.
    pub inputs: Tensor,
    /// Labels, one per instance.
    pub labels: Tensor,
}

impl Batch {
    pub fn new(inputs: Tensor, labels: Tensor) -> Self {
        Self { inputs, labels }
    }

    /// Number of instances in the batch.
    pub fn size(&self) -> usize {
        self.labels.len()
    }
}

/// One few-shot evaluation unit: a labeled support set and a query set to
/// classify.
#[derive(Clone)]
pub struct Episode {
    pub support: Batch,
    pub query: Batch,
}

impl Episode {
    pub fn new(support: Batch, query: Batch) -> Self {
        Self { support, query }
    }
}

/// Contract a data source implements to feed the training framework.
///
/// The framework owns three loaders (train/val/test) of the same type and
/// pulls from them; it never inspects what a loader yields beyond handing
/// the batch or episode to the model.
pub trait DataLoader {
    /// Produce the next training batch of the given size.
    ///
    /// Exhaustion is an error; the framework does not retry.
    fn next_batch(&mut self, batch_size: usize) -> Result<Batch>;

    /// Draw one support/query episode for a novel relation.
    ///
    /// `reference` is the training loader, available as a source of
    /// background classes when assembling the episode.
    fn next_new_relation(
        &mut self,
        reference: &mut Self,
        support_size: usize,
        query_size: usize,
        query_class: usize,
    ) -> Result<Episode>;
}
