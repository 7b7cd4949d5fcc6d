#![warn(missing_docs)]
//! Backend-independent core of DQN-family learners.
//!
//! A learner consumes a batch of transitions `(o_t, a_t, r_t, o_t+1, terminal_t)`,
//! regresses the Q-value of the taken action onto the temporal-difference target
//!
//! ```text
//! target = r_t + gamma * (1 - terminal_t) * max_a Q_target(o_t+1, a)
//! ```
//!
//! and keeps a target network in sync with the online network.
//! The tensor work lives in the backend crates; this crate holds the traits
//! they share, the configuration, the learning-rate schedule, records and
//! the reference math on plain slices.
pub mod error;
pub mod record;
pub mod td;

mod base;
pub use base::{check_action_index, check_batch_dim, Learner, QPolicy, TransitionBatch};

mod config;
pub use config::{CriticLoss, DqnConfig};

mod lr_scheduler;
pub use lr_scheduler::LrScheduler;
