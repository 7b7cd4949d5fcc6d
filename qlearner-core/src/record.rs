//! Types for recording training statistics.
//!
//! Learners return a [`Record`] from every update. A training loop is free to
//! write it to a logger, aggregate it or drop it.
//!
//! ```rust
//! use qlearner_core::record::{Record, RecordValue};
//!
//! let mut record = Record::from_scalar("Qloss", 0.5);
//! record.insert("predictQ", RecordValue::Scalar(1.2));
//! assert_eq!(record.get_scalar("Qloss").unwrap(), 0.5);
//! ```
mod base;

pub use base::{Record, RecordValue};
