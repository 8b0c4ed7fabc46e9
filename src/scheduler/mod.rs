//! Cache Storage operation scheduler
//!
//! Serializes and parallelizes the asynchronous operations of one cache
//! storage client. Operations run either exclusively or shared with other
//! shared operations, and are admitted in strict arrival order.

mod config;
mod cache_scheduler;
mod handle;
mod operation;
mod types;

pub use config::{DEFAULT_MAX_SHARED_OPS, MAX_SHARED_OPS_ENV, SchedulerConfig};
pub use cache_scheduler::CacheStorageScheduler;
pub use handle::{OperationCompletion, SchedulerHandle};
pub use operation::{Operation, OperationTask};
pub use types::{OperationId, SchedulerClient, SchedulerMode, SchedulerOp};
