//! Scheduler configuration

use std::env;

use crate::utils::{Result, SchedulerError};

/// Default cap on parallel shared operations.
///
/// Android runs shared operations one at a time.
#[cfg(target_os = "android")]
pub const DEFAULT_MAX_SHARED_OPS: usize = 1;
#[cfg(not(target_os = "android"))]
pub const DEFAULT_MAX_SHARED_OPS: usize = 16;

/// Environment variable overriding [`SchedulerConfig::max_shared_ops`]
pub const MAX_SHARED_OPS_ENV: &str = "BINIX_CACHE_STORAGE_MAX_SHARED_OPS";

/// Scheduler configuration, fixed for the scheduler's lifetime
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Cap on concurrently running shared operations
    pub max_shared_ops: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_shared_ops: DEFAULT_MAX_SHARED_OPS,
        }
    }
}

impl SchedulerConfig {
    /// Create a config with platform defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the shared operation cap
    pub fn with_max_shared_ops(mut self, max_shared_ops: usize) -> Self {
        self.max_shared_ops = max_shared_ops;
        self
    }

    /// Load defaults, then apply overrides from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load defaults, then apply overrides from `lookup`
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(MAX_SHARED_OPS_ENV) {
            config.max_shared_ops = raw.trim().parse().map_err(|_| {
                SchedulerError::InvalidConfig(format!(
                    "{} must be a positive integer, got {:?}",
                    MAX_SHARED_OPS_ENV, raw
                ))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would stall the scheduler
    pub fn validate(&self) -> Result<()> {
        if self.max_shared_ops == 0 {
            return Err(SchedulerError::InvalidConfig(
                "max_shared_ops must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
