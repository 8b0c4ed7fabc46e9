//! Message-passing front end for a scheduler
//!
//! [`SchedulerHandle::spawn`] moves a [`CacheStorageScheduler`] onto its own
//! named thread, which becomes the scheduler's sequence. Handles are cheap
//! to clone and may be used from any thread or task; every state change
//! still happens on the sequence thread, one command at a time.

use std::thread::{self, JoinHandle};

use tokio::sync::{mpsc, oneshot};

use super::cache_scheduler::CacheStorageScheduler;
use super::types::{OperationId, SchedulerClient, SchedulerMode, SchedulerOp};
use crate::utils::{Result, SchedulerError};

enum Command {
    CreateId(oneshot::Sender<OperationId>),
    Schedule {
        id: OperationId,
        mode: SchedulerMode,
        op_type: SchedulerOp,
        task: Box<dyn FnOnce() + Send + 'static>,
    },
    Complete(OperationId),
    ScheduledOperations(oneshot::Sender<bool>),
    IsRunningExclusive(oneshot::Sender<bool>),
    Shutdown,
}

/// Completion token passed to an operation's closure
///
/// Call [`complete`](Self::complete) exactly once when the operation's work
/// is done. Dropping the token without completing leaves the operation's
/// slot occupied.
#[must_use = "an operation that is never completed blocks its scheduler slot"]
pub struct OperationCompletion {
    id: OperationId,
    commands: mpsc::UnboundedSender<Command>,
    completed: bool,
}

impl OperationCompletion {
    pub fn id(&self) -> OperationId {
        self.id
    }

    /// Report the operation as finished
    pub fn complete(mut self) {
        self.completed = true;
        if self.commands.send(Command::Complete(self.id)).is_err() {
            log::debug!("operation {} completed after its sequence shut down", self.id);
        }
    }
}

impl Drop for OperationCompletion {
    fn drop(&mut self) {
        if !self.completed {
            log::warn!(
                "operation {} dropped without completing; its scheduler slot stays occupied",
                self.id
            );
        }
    }
}

/// Cloneable handle to a scheduler running on its own sequence
#[derive(Clone)]
pub struct SchedulerHandle {
    client: SchedulerClient,
    commands: mpsc::UnboundedSender<Command>,
}

impl SchedulerHandle {
    /// Move `scheduler` onto a new sequence thread
    ///
    /// The thread exits after [`shutdown`](Self::shutdown), or once every
    /// handle and completion token is gone.
    pub fn spawn(mut scheduler: CacheStorageScheduler) -> Result<(Self, JoinHandle<()>)> {
        let client = scheduler.client();
        let (commands, receiver) = mpsc::unbounded_channel();
        scheduler.detach_from_sequence();

        let join = thread::Builder::new()
            .name(format!("{}-scheduler", client.as_str().to_lowercase()))
            .spawn(move || run_sequence(scheduler, receiver))?;

        Ok((Self { client, commands }, join))
    }

    pub fn client(&self) -> SchedulerClient {
        self.client
    }

    /// Reserve a fresh operation id
    pub async fn create_id(&self) -> Result<OperationId> {
        let (reply, response) = oneshot::channel();
        self.send(Command::CreateId(reply))?;
        response.await.map_err(|_| SchedulerError::SequenceShutdown)
    }

    /// Enqueue `task` under `id`; it receives the token used to complete it
    pub fn schedule_operation<F>(
        &self,
        id: OperationId,
        mode: SchedulerMode,
        op_type: SchedulerOp,
        task: F,
    ) -> Result<()>
    where
        F: FnOnce(OperationCompletion) + Send + 'static,
    {
        let completion = OperationCompletion {
            id,
            commands: self.commands.clone(),
            completed: false,
        };
        self.send(Command::Schedule {
            id,
            mode,
            op_type,
            task: Box::new(move || task(completion)),
        })
    }

    /// Report running operation `id` as finished
    pub fn complete_operation_and_run_next(&self, id: OperationId) -> Result<()> {
        self.send(Command::Complete(id))
    }

    /// Whether any operation is pending or running
    pub async fn scheduled_operations(&self) -> Result<bool> {
        let (reply, response) = oneshot::channel();
        self.send(Command::ScheduledOperations(reply))?;
        response.await.map_err(|_| SchedulerError::SequenceShutdown)
    }

    /// Whether an exclusive operation is running
    pub async fn is_running_exclusive_operation(&self) -> Result<bool> {
        let (reply, response) = oneshot::channel();
        self.send(Command::IsRunningExclusive(reply))?;
        response.await.map_err(|_| SchedulerError::SequenceShutdown)
    }

    /// Run an async unit of work under the scheduler's admission rules.
    ///
    /// Once promoted, `work` is called and its future driven on the caller's
    /// tokio runtime. The operation completes when the future finishes, even
    /// if `work` or its future panics.
    pub async fn run<F, Fut, T>(&self, mode: SchedulerMode, op_type: SchedulerOp, work: F) -> Result<T>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let runtime = tokio::runtime::Handle::current();
        let id = self.create_id().await?;
        let (reply, response) = oneshot::channel();

        self.schedule_operation(id, mode, op_type, move |completion| {
            runtime.spawn(async move {
                // `work` is called inside the spawned task so a panic while
                // building the future also surfaces as a JoinError.
                let outcome = tokio::spawn(async move { work().await }).await;
                completion.complete();
                let _ = reply.send(outcome);
            });
        })?;

        match response.await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(_)) => Err(SchedulerError::OperationPanicked(id)),
            Err(_) => Err(SchedulerError::OperationDropped(id)),
        }
    }

    /// Stop the sequence. Pending operations are dropped without running.
    pub fn shutdown(&self) -> Result<()> {
        self.send(Command::Shutdown)
    }

    fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| SchedulerError::SequenceShutdown)
    }
}

fn run_sequence(mut scheduler: CacheStorageScheduler, mut receiver: mpsc::UnboundedReceiver<Command>) {
    log::debug!("{} scheduler sequence started", scheduler.client().as_str());

    while let Some(command) = receiver.blocking_recv() {
        match command {
            Command::CreateId(reply) => {
                let _ = reply.send(scheduler.create_id());
            }
            Command::Schedule {
                id,
                mode,
                op_type,
                task,
            } => scheduler.schedule_operation(id, mode, op_type, task),
            Command::Complete(id) => scheduler.complete_operation_and_run_next(id),
            Command::ScheduledOperations(reply) => {
                let _ = reply.send(scheduler.scheduled_operations());
            }
            Command::IsRunningExclusive(reply) => {
                let _ = reply.send(scheduler.is_running_exclusive_operation());
            }
            Command::Shutdown => break,
        }
    }

    log::debug!(
        "{} scheduler sequence stopped with {} pending and {} running operations",
        scheduler.client().as_str(),
        scheduler.pending_count(),
        scheduler.running_count()
    );
}
