//! Batch.
use crate::error::QlearnError;

/// A batch of transitions `(o_t, a_t, o_t+1, r_t, terminal_t)`.
///
/// The five arrays are aligned along the leading (batch) dimension.
pub trait TransitionBatch {
    /// A set of observations in a batch.
    type ObsBatch;

    /// A set of actions in a batch.
    type ActBatch;

    /// Unpacks the data `(o_t, a_t, o_t+1, r_t, terminal_t)`.
    fn unpack(
        self,
    ) -> (
        Self::ObsBatch,
        Self::ActBatch,
        Self::ObsBatch,
        Vec<f32>,
        Vec<i8>,
    );

    /// Returns the number of transitions.
    fn len(&self) -> usize;

    /// Returns `o_t`.
    fn obs(&self) -> &Self::ObsBatch;

    /// Returns `a_t`.
    fn act(&self) -> &Self::ActBatch;

    /// Returns `o_t+1`.
    fn next_obs(&self) -> &Self::ObsBatch;

    /// Returns `r_t`.
    fn reward(&self) -> &Vec<f32>;

    /// Returns `terminal_t`.
    fn is_terminated(&self) -> &Vec<i8>;
}

/// Checks that an array of a batch has `expected` rows.
pub fn check_batch_dim(name: &str, expected: usize, actual: usize) -> Result<(), QlearnError> {
    if expected != actual {
        return Err(QlearnError::BatchShapeError {
            name: name.to_string(),
            expected,
            actual,
        });
    }
    Ok(())
}

/// Checks that every action index is in `0..n_actions`.
pub fn check_action_index(act: &[i64], n_actions: usize) -> Result<(), QlearnError> {
    match act.iter().find(|&&a| a < 0 || a as usize >= n_actions) {
        Some(&index) => Err(QlearnError::ActionIndexError { index, n_actions }),
        None => Ok(()),
    }
}
