//! Configuration of DQN-family learners.
use crate::{error::QlearnError, LrScheduler};
use anyhow::Result;
use log::info;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Critic loss type.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone, Copy)]
pub enum CriticLoss {
    /// Mean squared error.
    Mse,

    /// Smooth L1 loss.
    SmoothL1,
}

impl Default for CriticLoss {
    fn default() -> Self {
        Self::Mse
    }
}

/// Configuration of a DQN learner.
///
/// The same configuration drives the learners of every backend.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct DqnConfig {
    /// Base learning rate of the optimizer.
    pub learning_rate: f64,

    /// Discount factor.
    pub gamma: f64,

    /// Interval of target network synchronization in updates.
    pub sync_frequency: usize,

    /// Soft update coefficient. `None` means a hard copy at every sync.
    #[serde(default)]
    pub tau: Option<f64>,

    /// Selects the next action with the online network (double DQN).
    #[serde(default)]
    pub double_dqn: bool,

    /// Loss between the predicted Q-values and the TD targets.
    #[serde(default)]
    pub critic_loss: CriticLoss,

    /// Learning rate schedule.
    #[serde(default)]
    pub lr_scheduler: LrScheduler,

    /// Epsilon of the Adam optimizer.
    #[serde(default = "default_adam_eps")]
    pub adam_eps: f64,
}

fn default_adam_eps() -> f64 {
    1e-5
}

impl Default for DqnConfig {
    fn default() -> Self {
        Self {
            learning_rate: 1e-4,
            gamma: 0.99,
            sync_frequency: 100,
            tau: None,
            double_dqn: false,
            critic_loss: CriticLoss::Mse,
            lr_scheduler: LrScheduler::Constant,
            adam_eps: default_adam_eps(),
        }
    }
}

impl DqnConfig {
    /// Sets the base learning rate.
    pub fn learning_rate(mut self, v: f64) -> Self {
        self.learning_rate = v;
        self
    }

    /// Sets the discount factor.
    pub fn gamma(mut self, v: f64) -> Self {
        self.gamma = v;
        self
    }

    /// Sets the interval of target network synchronization.
    pub fn sync_frequency(mut self, v: usize) -> Self {
        self.sync_frequency = v;
        self
    }

    /// Soft update coefficient.
    pub fn tau(mut self, v: Option<f64>) -> Self {
        self.tau = v;
        self
    }

    /// Double DQN.
    pub fn double_dqn(mut self, v: bool) -> Self {
        self.double_dqn = v;
        self
    }

    /// Sets the critic loss.
    pub fn critic_loss(mut self, v: CriticLoss) -> Self {
        self.critic_loss = v;
        self
    }

    /// Sets the learning rate schedule.
    pub fn lr_scheduler(mut self, v: LrScheduler) -> Self {
        self.lr_scheduler = v;
        self
    }

    /// Sets epsilon of the Adam optimizer.
    pub fn adam_eps(mut self, v: f64) -> Self {
        self.adam_eps = v;
        self
    }

    /// Checks the values of the configuration.
    pub fn check(&self) -> Result<(), QlearnError> {
        if self.sync_frequency == 0 {
            return Err(QlearnError::ConfigError(
                "sync_frequency must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(QlearnError::ConfigError(format!(
                "gamma must be in [0, 1], got {}",
                self.gamma
            )));
        }
        if self.learning_rate <= 0.0 {
            return Err(QlearnError::ConfigError(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if let Some(tau) = self.tau {
            if !(tau > 0.0 && tau <= 1.0) {
                return Err(QlearnError::ConfigError(format!(
                    "tau must be in (0, 1], got {}",
                    tau
                )));
            }
        }
        Ok(())
    }

    /// Loads [`DqnConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path_ = path.as_ref().to_owned();
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        info!("Load config of DQN learner from {:?}", path_);
        Ok(b)
    }

    /// Saves [`DqnConfig`] as a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path_ = path.as_ref().to_owned();
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        info!("Save config of DQN learner into {:?}", path_);
        Ok(())
    }
}
