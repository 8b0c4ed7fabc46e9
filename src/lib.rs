//! # Binix Cache Storage
//!
//! Operation scheduling for the Binix browser's Cache Storage API backend.
//!
//! ## Architecture
//!
//! - **scheduler**: the per-client scheduler, its operations and ids, and a
//!   message-passing handle for driving it from async code
//! - **runner**: sequential task runners the scheduler dispatches onto
//! - **metrics**: queue length, queue duration and parallelism samples
//! - **utils**: shared utilities and error types

pub mod metrics;
pub mod runner;
pub mod scheduler;
pub mod utils;

// Re-export main types for convenience
pub use metrics::{HistogramRecorder, LogMetricsSink, MetricsSink, NoopMetricsSink};
pub use runner::{ManualTaskRunner, SequencedTaskRunner, TaskRunner};
pub use scheduler::{
    CacheStorageScheduler, OperationCompletion, OperationId, SchedulerClient, SchedulerConfig,
    SchedulerHandle, SchedulerMode, SchedulerOp,
};
pub use utils::error::{Result, SchedulerError};

/// Crate version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = "Binix Cache Storage";
