//! Policy.
use anyhow::Result;
use std::path::Path;

/// An action-value policy with an online network and a target network.
///
/// Both networks map a batch of observations to per-action Q-values
/// of shape `[batch_size, action_dim]`.
pub trait QPolicy {
    /// Batch of observations.
    type Input;

    /// Per-action Q-values.
    type Output;

    /// Q-values of the online network.
    fn forward(&self, obs: &Self::Input) -> Result<Self::Output>;

    /// Q-values of the target network.
    fn forward_target(&self, obs: &Self::Input) -> Result<Self::Output>;

    /// Copies the parameters of the online network into the target network.
    fn copy_target(&mut self) -> Result<()>;

    /// Soft update of the target network.
    ///
    /// target = tau * online + (1.0 - tau) * target
    fn soft_update_target(&mut self, tau: f64) -> Result<()>;

    /// Returns the number of discrete actions.
    fn action_dim(&self) -> usize;

    /// Saves the parameters of both networks in the given directory.
    fn save<T: AsRef<Path>>(&self, path: T) -> Result<()>;

    /// Loads the parameters of both networks from the given directory.
    fn load<T: AsRef<Path>>(&mut self, path: T) -> Result<()>;
}
