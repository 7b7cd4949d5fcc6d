//! Core traits.
mod batch;
mod learner;
mod policy;
pub use batch::{check_action_index, check_batch_dim, TransitionBatch};
pub use learner::Learner;
pub use policy::QPolicy;
