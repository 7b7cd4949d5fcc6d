//! Errors in the library.
use thiserror::Error;

/// Errors in the library.
#[derive(Error, Debug)]
pub enum QlearnError {
    /// Record key error.
    #[error("Record key error: {0}")]
    RecordKeyError(String),

    /// Record value type error.
    #[error("Record value type error: {0}")]
    RecordValueTypeError(String),

    /// The arrays of a transition batch disagree on the batch dimension.
    #[error("Batch shape error: {name} has {actual} rows, expected {expected}")]
    BatchShapeError {
        /// Name of the offending array.
        name: String,
        /// Expected number of rows.
        expected: usize,
        /// Actual number of rows.
        actual: usize,
    },

    /// Invalid configuration value.
    #[error("Config error: {0}")]
    ConfigError(String),

    /// Action index out of range.
    #[error("Action index {index} is out of range for {n_actions} actions")]
    ActionIndexError {
        /// The action index.
        index: i64,
        /// The number of actions.
        n_actions: usize,
    },
}
