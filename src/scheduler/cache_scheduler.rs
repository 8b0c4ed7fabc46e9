//! The scheduler state machine

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use super::config::SchedulerConfig;
use super::operation::Operation;
use super::types::{OperationId, SchedulerClient, SchedulerMode, SchedulerOp};
use crate::metrics::{MetricsSink, NoopMetricsSink};
use crate::runner::TaskRunner;
use crate::utils::{Result, SequenceChecker};

/// Sequences the asynchronous operations of one cache storage client.
///
/// Exclusive operations never overlap with any other operation. Shared
/// operations overlap only with each other, up to `max_shared_ops`.
/// Pending operations are promoted strictly in arrival order: a head
/// operation that cannot start blocks everything queued behind it.
///
/// Every promoted operation must eventually be reported through
/// [`complete_operation_and_run_next`](Self::complete_operation_and_run_next).
/// An operation that never completes holds its slot forever; an exclusive
/// one stalls the whole scheduler.
///
/// All methods must be called from one sequence. This is checked in debug
/// builds.
pub struct CacheStorageScheduler {
    client: SchedulerClient,
    task_runner: Arc<dyn TaskRunner>,
    metrics: Arc<dyn MetricsSink>,
    max_shared_ops: usize,

    pending_operations: VecDeque<Operation>,
    running_operations: HashMap<OperationId, Operation>,
    next_id: u64,

    num_running_exclusive: usize,
    num_running_shared: usize,
    peak_parallel_shared: usize,

    sequence_checker: SequenceChecker,
}

impl CacheStorageScheduler {
    /// Create a scheduler dispatching onto `task_runner`
    pub fn new(
        client: SchedulerClient,
        task_runner: Arc<dyn TaskRunner>,
        config: SchedulerConfig,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            client,
            task_runner,
            metrics: Arc::new(NoopMetricsSink),
            max_shared_ops: config.max_shared_ops,
            pending_operations: VecDeque::new(),
            running_operations: HashMap::new(),
            next_id: 0,
            num_running_exclusive: 0,
            num_running_shared: 0,
            peak_parallel_shared: 0,
            sequence_checker: SequenceChecker::new(),
        })
    }

    /// Report instrumentation samples to `metrics`
    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Allow the scheduler to be driven from a different sequence.
    ///
    /// Only meaningful while nothing else holds the scheduler.
    pub fn detach_from_sequence(&mut self) {
        self.sequence_checker.detach();
    }

    /// Reserve a fresh operation id
    pub fn create_id(&mut self) -> OperationId {
        self.check_sequence();

        let id = OperationId::new(self.next_id);
        self.next_id = self
            .next_id
            .checked_add(1)
            .unwrap_or_else(|| panic!("operation id space exhausted"));
        id
    }

    /// Enqueue an operation and start whatever can run.
    ///
    /// `id` must come from [`create_id`](Self::create_id) on this scheduler
    /// and must not have been scheduled before. Issuing a foreign id, or
    /// scheduling an id that is still pending or running, panics. An id
    /// rescheduled after its operation completed is not detected.
    pub fn schedule_operation<F>(
        &mut self,
        id: OperationId,
        mode: SchedulerMode,
        op_type: SchedulerOp,
        task: F,
    ) where
        F: FnOnce() + Send + 'static,
    {
        self.check_sequence();
        assert!(
            id.as_u64() < self.next_id,
            "operation {} was not issued by this scheduler",
            id
        );
        assert!(
            !self.running_operations.contains_key(&id)
                && !self.pending_operations.iter().any(|op| op.id() == id),
            "operation {} was already scheduled",
            id
        );

        self.metrics
            .record_queue_length(self.client, op_type, self.pending_operations.len());

        log::trace!(
            "{}: queued {} operation {} ({})",
            self.client.as_str(),
            mode.as_str(),
            id,
            op_type
        );
        self.pending_operations.push_back(Operation::new(
            Box::new(task),
            id,
            self.client,
            mode,
            op_type,
        ));

        self.maybe_run_operation();
    }

    /// Release the slot held by running operation `id` and start whatever
    /// can run next.
    ///
    /// Panics if `id` is not running.
    pub fn complete_operation_and_run_next(&mut self, id: OperationId) {
        self.check_sequence();

        let Some(operation) = self.running_operations.remove(&id) else {
            panic!("completed operation {} is not running", id);
        };
        debug_assert_eq!(operation.id(), id);

        match operation.mode() {
            SchedulerMode::Shared => {
                debug_assert_eq!(self.num_running_exclusive, 0);
                debug_assert!(self.num_running_shared > 0);
                self.num_running_shared -= 1;
                if self.num_running_shared == 0 {
                    self.metrics
                        .record_peak_parallel_shared(self.client, self.peak_parallel_shared);
                    self.peak_parallel_shared = 0;
                }
            }
            SchedulerMode::Exclusive => {
                debug_assert_eq!(self.num_running_shared, 0);
                debug_assert_eq!(self.num_running_exclusive, 1);
                self.num_running_exclusive -= 1;
            }
        }

        log::trace!(
            "{}: completed {} operation {}",
            self.client.as_str(),
            operation.mode().as_str(),
            id
        );
        drop(operation);

        self.maybe_run_operation();
    }

    /// Whether any operation is pending or running
    pub fn scheduled_operations(&self) -> bool {
        self.check_sequence();
        !self.running_operations.is_empty() || !self.pending_operations.is_empty()
    }

    /// Whether an exclusive operation is running
    pub fn is_running_exclusive_operation(&self) -> bool {
        self.check_sequence();
        self.num_running_exclusive > 0
    }

    pub fn client(&self) -> SchedulerClient {
        self.client
    }

    pub fn max_shared_ops(&self) -> usize {
        self.max_shared_ops
    }

    pub fn pending_count(&self) -> usize {
        self.pending_operations.len()
    }

    pub fn running_count(&self) -> usize {
        self.running_operations.len()
    }

    pub fn running_shared_count(&self) -> usize {
        self.num_running_shared
    }

    pub fn running_exclusive_count(&self) -> usize {
        self.num_running_exclusive
    }

    /// Promote operations from the head of the pending queue.
    ///
    /// Shared heads keep promoting while slots are free; an exclusive head
    /// stops promotion once started.
    fn maybe_run_operation(&mut self) {
        while let Some(next) = self.pending_operations.front() {
            let mode = next.mode();
            let runnable = match mode {
                SchedulerMode::Shared => {
                    self.num_running_exclusive == 0 && self.num_running_shared < self.max_shared_ops
                }
                SchedulerMode::Exclusive => {
                    self.num_running_exclusive == 0 && self.num_running_shared == 0
                }
            };
            if !runnable {
                break;
            }

            let Some(operation) = self.pending_operations.pop_front() else {
                break;
            };
            let id = operation.id();

            self.metrics.record_queue_duration(
                self.client,
                operation.op_type(),
                operation.queue_duration(),
            );

            match mode {
                SchedulerMode::Shared => {
                    debug_assert_eq!(self.num_running_exclusive, 0);
                    self.num_running_shared += 1;
                    self.peak_parallel_shared = self.peak_parallel_shared.max(self.num_running_shared);
                }
                SchedulerMode::Exclusive => {
                    debug_assert_eq!(self.num_running_exclusive, 0);
                    debug_assert_eq!(self.num_running_shared, 0);
                    self.num_running_exclusive += 1;
                }
            }

            let task = operation.dispatch_task();
            debug_assert!(!self.running_operations.contains_key(&id));
            self.running_operations.insert(id, operation);

            log::trace!(
                "{}: dispatching {} operation {} ({} shared running)",
                self.client.as_str(),
                mode.as_str(),
                id,
                self.num_running_shared
            );
            if let Err(e) = self.task_runner.post_task(task) {
                log::error!(
                    "{}: failed to dispatch operation {}: {}",
                    self.client.as_str(),
                    id,
                    e
                );
            }

            if mode == SchedulerMode::Exclusive {
                break;
            }
        }

        debug_assert!(self.num_running_exclusive == 0 || self.num_running_shared == 0);
        debug_assert!(self.num_running_shared <= self.max_shared_ops);
    }

    fn check_sequence(&self) {
        debug_assert!(
            self.sequence_checker.called_on_valid_sequence(),
            "CacheStorageScheduler used from more than one sequence"
        );
    }
}

impl Drop for CacheStorageScheduler {
    fn drop(&mut self) {
        // Skip the check while unwinding so a failed assertion is not
        // turned into an abort.
        if !std::thread::panicking() {
            self.check_sequence();
        }
    }
}
