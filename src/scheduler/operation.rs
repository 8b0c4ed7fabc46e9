//! A unit of work owned by the scheduler

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use super::types::{OperationId, SchedulerClient, SchedulerMode, SchedulerOp};
use crate::runner::Task;

/// Closure executed when an operation is promoted
///
/// The closure must eventually lead to exactly one
/// `complete_operation_and_run_next` call for its id.
pub type OperationTask = Box<dyn FnOnce() + Send + 'static>;

/// An operation waiting in, or running from, a scheduler
pub struct Operation {
    id: OperationId,
    client: SchedulerClient,
    mode: SchedulerMode,
    op_type: SchedulerOp,
    created_at: Instant,
    task: Arc<Mutex<Option<OperationTask>>>,
}

impl Operation {
    /// Create a new operation, stamping its creation time
    pub fn new(
        task: OperationTask,
        id: OperationId,
        client: SchedulerClient,
        mode: SchedulerMode,
        op_type: SchedulerOp,
    ) -> Self {
        Self {
            id,
            client,
            mode,
            op_type,
            created_at: Instant::now(),
            task: Arc::new(Mutex::new(Some(task))),
        }
    }

    pub fn id(&self) -> OperationId {
        self.id
    }

    pub fn client(&self) -> SchedulerClient {
        self.client
    }

    pub fn mode(&self) -> SchedulerMode {
        self.mode
    }

    pub fn op_type(&self) -> SchedulerOp {
        self.op_type
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Time elapsed since the operation was created
    pub fn queue_duration(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Build the task posted to the runner when this operation is promoted.
    ///
    /// The posted task holds only a weak reference to the closure: if the
    /// operation is destroyed before the runner gets to it, nothing runs.
    pub(crate) fn dispatch_task(&self) -> Task {
        let id = self.id;
        let slot = Arc::downgrade(&self.task);
        Box::new(move || {
            let task = match slot.upgrade() {
                Some(slot) => slot.lock().ok().and_then(|mut task| task.take()),
                None => None,
            };

            match task {
                Some(task) => task(),
                None => log::trace!("operation {} destroyed before it ran", id),
            }
        })
    }
}

impl std::fmt::Debug for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Operation")
            .field("id", &self.id)
            .field("client", &self.client)
            .field("mode", &self.mode)
            .field("op_type", &self.op_type)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_operation(counter: &Arc<AtomicUsize>) -> Operation {
        let counter = Arc::clone(counter);
        Operation::new(
            Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
            OperationId::new(3),
            SchedulerClient::Cache,
            SchedulerMode::Shared,
            SchedulerOp::Match,
        )
    }

    #[test]
    fn test_operation_accessors() {
        let counter = Arc::new(AtomicUsize::new(0));
        let operation = counting_operation(&counter);
        assert_eq!(operation.id(), OperationId::new(3));
        assert_eq!(operation.client(), SchedulerClient::Cache);
        assert_eq!(operation.mode(), SchedulerMode::Shared);
        assert_eq!(operation.op_type(), SchedulerOp::Match);
        assert!(operation.created_at() <= Instant::now());
    }

    #[test]
    fn test_dispatch_runs_closure_once() {
        let counter = Arc::new(AtomicUsize::new(0));
        let operation = counting_operation(&counter);

        let first = operation.dispatch_task();
        let second = operation.dispatch_task();
        first();
        second();

        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_dispatch_after_destroy_is_noop() {
        let counter = Arc::new(AtomicUsize::new(0));
        let operation = counting_operation(&counter);

        let task = operation.dispatch_task();
        drop(operation);
        task();

        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }
}
