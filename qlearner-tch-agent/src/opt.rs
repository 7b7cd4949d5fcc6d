//! Optimizers.
use anyhow::Result;
use serde::{Deserialize, Serialize};
use tch::{
    nn::{Adam, Optimizer as Optimizer_, OptimizerConfig as OptimizerConfig_, VarStore},
    Tensor,
};

/// Configures an optimizer for training the online network.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub enum OptimizerConfig {
    /// Adam optimizer.
    Adam {
        /// Learning rate.
        lr: f64,
        /// Term added to the denominator for numerical stability.
        eps: f64,
    },
}

impl OptimizerConfig {
    /// Constructs an optimizer.
    pub fn build(&self, vs: &VarStore) -> Result<Optimizer> {
        match &self {
            OptimizerConfig::Adam { lr, eps } => {
                let opt = Adam {
                    eps: *eps,
                    ..Adam::default()
                }
                .build(vs, *lr)?;
                Ok(Optimizer::Adam(opt, *lr))
            }
        }
    }
}

/// Optimizers.
///
/// This is a thin wrapper of [tch::nn::Optimizer] keeping track of the learning rate,
/// which tch does not expose.
///
/// [tch::nn::Optimizer]: https://docs.rs/tch/0.16.0/tch/nn/struct.Optimizer.html
pub enum Optimizer {
    /// Adam optimizer.
    Adam(Optimizer_, f64),
}

impl Optimizer {
    /// Applies a backward step pass.
    pub fn backward_step(&mut self, loss: &Tensor) {
        match self {
            Self::Adam(opt, _) => opt.backward_step(loss),
        }
    }

    /// Returns the current learning rate.
    pub fn learning_rate(&self) -> f64 {
        match self {
            Self::Adam(_, lr) => *lr,
        }
    }

    /// Sets the learning rate used by the following steps.
    pub fn set_learning_rate(&mut self, lr: f64) {
        match self {
            Self::Adam(opt, lr_) => {
                opt.set_lr(lr);
                *lr_ = lr;
            }
        }
    }
}
