//! Manually drained task runner
//!
//! Tasks sit in a queue until the owner calls [`ManualTaskRunner::run_next`]
//! or [`ManualTaskRunner::run_until_idle`]. Useful wherever the interleaving
//! of dispatch and completion has to be deterministic.

use std::collections::VecDeque;
use std::sync::Mutex;

use super::{Task, TaskRunner};
use crate::utils::{Result, SchedulerError};

#[derive(Default)]
pub struct ManualTaskRunner {
    queue: Mutex<VecDeque<Task>>,
}

impl ManualTaskRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tasks posted but not yet run
    pub fn pending_tasks(&self) -> usize {
        self.queue.lock().map(|q| q.len()).unwrap_or(0)
    }

    /// Run the oldest queued task. Returns false if the queue was empty.
    pub fn run_next(&self) -> bool {
        // The lock is released before the task runs so it may post more tasks.
        let task = self.queue.lock().ok().and_then(|mut q| q.pop_front());
        match task {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }

    /// Run tasks until the queue is empty, including tasks posted meanwhile
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        while self.run_next() {
            ran += 1;
        }
        ran
    }
}

impl TaskRunner for ManualTaskRunner {
    fn post_task(&self, task: Task) -> Result<()> {
        let mut queue = self
            .queue
            .lock()
            .map_err(|_| SchedulerError::RunnerShutdown)?;
        queue.push_back(task);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_tasks_wait_for_drain() {
        let runner = ManualTaskRunner::new();
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let counter = Arc::clone(&counter);
            runner
                .post_task(Box::new(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                }))
                .unwrap();
        }

        assert_eq!(runner.pending_tasks(), 3);
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        assert!(runner.run_next());
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        assert_eq!(runner.run_until_idle(), 2);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert!(!runner.run_next());
    }

    #[test]
    fn test_task_may_post_more_tasks() {
        let runner = Arc::new(ManualTaskRunner::new());
        let counter = Arc::new(AtomicUsize::new(0));

        let inner_runner = Arc::clone(&runner);
        let inner_counter = Arc::clone(&counter);
        runner
            .post_task(Box::new(move || {
                let counter = Arc::clone(&inner_counter);
                inner_runner
                    .post_task(Box::new(move || {
                        counter.fetch_add(1, Ordering::SeqCst);
                    }))
                    .unwrap();
            }))
            .unwrap();

        assert_eq!(runner.run_until_idle(), 2);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_poisoned_queue_rejects_tasks() {
        let runner = Arc::new(ManualTaskRunner::new());

        let poisoner = Arc::clone(&runner);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.queue.lock().unwrap();
            panic!("poison the queue");
        })
        .join();

        let result = runner.post_task(Box::new(|| {}));
        assert!(matches!(result, Err(SchedulerError::RunnerShutdown)));
    }
}
