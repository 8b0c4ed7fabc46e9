//! Sequential task runners
//!
//! The scheduler never runs operation closures itself. It posts them to a
//! [`TaskRunner`], which must execute tasks in the order posted and never
//! run two of its tasks at the same time.

mod manual;
mod sequenced;

pub use manual::ManualTaskRunner;
pub use sequenced::SequencedTaskRunner;

use crate::utils::Result;

/// A unit of work posted to a runner
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Outbound dispatch primitive consumed by the scheduler
pub trait TaskRunner: Send + Sync {
    /// Queue `task` for asynchronous execution
    fn post_task(&self, task: Task) -> Result<()>;
}
