//! Learning rate schedules.
use serde::{Deserialize, Serialize};

/// Learning rate as a function of the iteration index.
///
/// The schedule multiplies the base learning rate of the learner by a factor.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub enum LrScheduler {
    /// The base learning rate at every iteration.
    Constant,

    /// Linear interpolation of the factor from `start_factor` to `end_factor`
    /// over `total_iters` iterations, then `end_factor` afterwards.
    Linear {
        /// Factor at iteration 0.
        start_factor: f64,
        /// Factor from iteration `total_iters` on.
        end_factor: f64,
        /// Number of iterations of the decay.
        total_iters: usize,
    },
}

impl Default for LrScheduler {
    fn default() -> Self {
        Self::Constant
    }
}

impl LrScheduler {
    /// Returns the factor applied to the base learning rate at iteration `i`.
    pub fn factor(&self, i: usize) -> f64 {
        match self {
            Self::Constant => 1.0,
            Self::Linear {
                start_factor,
                end_factor,
                total_iters,
            } => {
                if *total_iters == 0 {
                    return *end_factor;
                }
                let progress = i.min(*total_iters) as f64 / *total_iters as f64;
                start_factor + (end_factor - start_factor) * progress
            }
        }
    }

    /// Returns the learning rate at iteration `i`.
    pub fn lr(&self, base_lr: f64, i: usize) -> f64 {
        base_lr * self.factor(i)
    }
}
