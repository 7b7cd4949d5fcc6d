//! DQN learner.
mod base;
mod explorer;
mod model;
mod policy;
pub use base::DqnLearner;
pub use explorer::{DqnExplorer, EpsilonGreedy, Softmax};
pub use model::DqnModel;
pub use policy::{DqnPolicy, DqnPolicyConfig};
