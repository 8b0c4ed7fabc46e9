//! Tokio-backed sequenced task runner

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::{Task, TaskRunner};
use crate::utils::{Result, SchedulerError};

/// Runs posted tasks one at a time, in FIFO order, on a tokio task
///
/// The draining task exits once every runner clone is dropped and the
/// queue is empty.
#[derive(Clone)]
pub struct SequencedTaskRunner {
    sender: mpsc::UnboundedSender<Task>,
}

impl SequencedTaskRunner {
    /// Spawn the runner on the current tokio runtime
    ///
    /// Panics when called outside a runtime, like `tokio::spawn`.
    pub fn spawn() -> (Self, JoinHandle<()>) {
        Self::spawn_on(&Handle::current())
    }

    /// Spawn the runner on an explicit runtime
    pub fn spawn_on(handle: &Handle) -> (Self, JoinHandle<()>) {
        let (sender, mut receiver) = mpsc::unbounded_channel::<Task>();

        let join = handle.spawn(async move {
            while let Some(task) = receiver.recv().await {
                task();
            }
            log::debug!("sequenced task runner drained and stopped");
        });

        (Self { sender }, join)
    }
}

impl TaskRunner for SequencedTaskRunner {
    fn post_task(&self, task: Task) -> Result<()> {
        self.sender
            .send(task)
            .map_err(|_| SchedulerError::RunnerShutdown)
    }
}
