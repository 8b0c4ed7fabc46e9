//! Shared utilities and error types

pub mod error;
pub mod sequence;

pub use error::{Result, SchedulerError};
pub use sequence::SequenceChecker;
