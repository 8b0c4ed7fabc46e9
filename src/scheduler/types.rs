//! Identifiers and tags shared by the scheduler

use std::fmt;

/// Identifier handed out by [`CacheStorageScheduler::create_id`]
///
/// Ids increase monotonically and are never reused by the scheduler
/// that issued them.
///
/// [`CacheStorageScheduler::create_id`]: super::CacheStorageScheduler::create_id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperationId(u64);

impl OperationId {
    /// Wrap a raw id value
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Raw id value
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How an operation may overlap with others
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchedulerMode {
    /// Runs alone
    Exclusive,
    /// Runs alongside other shared operations, up to the configured cap
    Shared,
}

impl SchedulerMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchedulerMode::Exclusive => "Exclusive",
            SchedulerMode::Shared => "Shared",
        }
    }
}

/// Which cache storage object owns the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchedulerClient {
    /// The per-origin CacheStorage object
    Storage,
    /// A single Cache within a CacheStorage
    Cache,
}

impl SchedulerClient {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchedulerClient::Storage => "CacheStorage",
            SchedulerClient::Cache => "Cache",
        }
    }
}

/// Operation kind, used only to group instrumentation samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchedulerOp {
    BackgroundSync,
    Close,
    Delete,
    GetAllMatched,
    Has,
    Init,
    Keys,
    Match,
    MatchAll,
    Open,
    Put,
    Size,
    SizeThenClose,
    Test,
    WriteIndex,
    WriteSideData,
}

impl SchedulerOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchedulerOp::BackgroundSync => "BackgroundSync",
            SchedulerOp::Close => "Close",
            SchedulerOp::Delete => "Delete",
            SchedulerOp::GetAllMatched => "GetAllMatched",
            SchedulerOp::Has => "Has",
            SchedulerOp::Init => "Init",
            SchedulerOp::Keys => "Keys",
            SchedulerOp::Match => "Match",
            SchedulerOp::MatchAll => "MatchAll",
            SchedulerOp::Open => "Open",
            SchedulerOp::Put => "Put",
            SchedulerOp::Size => "Size",
            SchedulerOp::SizeThenClose => "SizeThenClose",
            SchedulerOp::Test => "Test",
            SchedulerOp::WriteIndex => "WriteIndex",
            SchedulerOp::WriteSideData => "WriteSideData",
        }
    }
}

impl fmt::Display for SchedulerOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
