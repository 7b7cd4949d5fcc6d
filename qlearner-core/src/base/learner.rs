//! Learner.
use crate::record::Record;
use anyhow::Result;

/// Computes a loss from a batch of transitions and updates a policy with it.
///
/// A training loop calls [`Learner::update`] once per training step.
pub trait Learner {
    /// Batch of transitions consumed by the learner.
    type Batch;

    /// Performs one optimization step and returns training statistics.
    fn update(&mut self, batch: Self::Batch) -> Result<Record>;

    /// Returns the number of updates performed so far.
    fn iterations(&self) -> usize;
}
