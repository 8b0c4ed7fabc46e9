//! Error types for the Cache Storage scheduler

use thiserror::Error;

use crate::scheduler::OperationId;

/// Main error type for scheduler operations
///
/// Contract violations (completing an operation that is not running,
/// scheduling an id twice) are not represented here: they panic.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Configuration rejected at construction time
    #[error("invalid scheduler configuration: {0}")]
    InvalidConfig(String),

    /// The task runner no longer accepts tasks
    #[error("task runner has shut down")]
    RunnerShutdown,

    /// The scheduler sequence behind a handle has stopped
    #[error("scheduler sequence has shut down")]
    SequenceShutdown,

    /// The operation was destroyed before it produced a result
    #[error("operation {0} was dropped before it produced a result")]
    OperationDropped(OperationId),

    /// The operation's work panicked
    #[error("operation {0} panicked")]
    OperationPanicked(OperationId),

    /// I/O errors (spawning the sequence thread)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type for scheduler operations
pub type Result<T> = std::result::Result<T, SchedulerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SchedulerError::InvalidConfig("max_shared_ops must be at least 1".to_string());
        assert_eq!(
            err.to_string(),
            "invalid scheduler configuration: max_shared_ops must be at least 1"
        );
        assert_eq!(
            SchedulerError::OperationDropped(OperationId::new(7)).to_string(),
            "operation 7 was dropped before it produced a result"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io = std::io::Error::other("thread spawn failed");
        let err: SchedulerError = io.into();
        assert!(matches!(err, SchedulerError::Io(_)));
    }
}
