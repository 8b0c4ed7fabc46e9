//! Sequence affinity checking
//!
//! The scheduler keeps no locks around its queues. Every call must come
//! from the same sequence; in this crate a sequence is one OS thread.

use std::sync::OnceLock;
use std::thread::{self, ThreadId};

/// Binds to the first thread that checks it
#[derive(Debug, Default)]
pub struct SequenceChecker {
    bound: OnceLock<ThreadId>,
}

impl SequenceChecker {
    /// Create a checker that is not yet bound to any thread
    pub fn new() -> Self {
        Self::default()
    }

    /// Check the current thread, binding to it on first use
    pub fn called_on_valid_sequence(&self) -> bool {
        let current = thread::current().id();
        *self.bound.get_or_init(|| current) == current
    }

    /// Forget the bound thread so the owner can move to another sequence
    pub fn detach(&mut self) {
        self.bound = OnceLock::new();
    }
}
