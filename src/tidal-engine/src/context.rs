//! Execution context handed to source construction.
//!
//! The context carries what a query brings along at run time: the current
//! user, the cancellation token, the memory budget, the bounds of the stream
//! and the runtime configuration.

use std::sync::Arc;

use common_config::{ExecutionConfig, ReadErrorPolicy};
use common_runtime::CancellationToken;
use tidal_core::ResolvedBounds;
use tidal_storage::{MemoryManager, User, memory_manager};

// ============================================================================
// Runtime Configuration
// ============================================================================

/// Runtime configuration for storage sources.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// What a source does when a reader call fails.
    pub read_error_policy: ReadErrorPolicy,
    /// Memory limit in bytes for in-flight tables.
    pub memory_limit: Option<usize>,
}

impl RuntimeConfig {
    /// Set the read error policy.
    #[must_use]
    pub const fn with_read_error_policy(mut self, policy: ReadErrorPolicy) -> Self {
        self.read_error_policy = policy;
        self
    }

    /// Set the memory limit.
    #[must_use]
    pub const fn with_memory_limit(mut self, limit: usize) -> Self {
        self.memory_limit = Some(limit);
        self
    }
}

impl From<&ExecutionConfig> for RuntimeConfig {
    fn from(config: &ExecutionConfig) -> Self {
        Self {
            read_error_policy: config.read_error_policy,
            memory_limit: config.memory_limit,
        }
    }
}

// ============================================================================
// Execution Context
// ============================================================================

/// Per-query context read by source construction.
///
/// The context is read-only to sources; each source copies what it needs.
#[derive(Clone)]
pub struct ExecutionContext {
    user: Option<User>,
    cancel: CancellationToken,
    memory: Arc<dyn MemoryManager>,
    bounds: Option<ResolvedBounds>,
    config: RuntimeConfig,
}

impl std::fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("user", &self.user)
            .field("bounds", &self.bounds)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ExecutionContext {
    /// Create a context with no user, no bounds and an unlimited budget.
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    /// Create a context whose memory budget follows `config`.
    pub fn with_config(config: RuntimeConfig) -> Self {
        Self {
            user: None,
            cancel: CancellationToken::never(),
            memory: memory_manager(config.memory_limit),
            bounds: None,
            config,
        }
    }

    /// Set the current user.
    #[must_use]
    pub fn with_user(mut self, user: User) -> Self {
        self.user = Some(user);
        self
    }

    /// Set the cancellation token.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Replace the memory manager.
    #[must_use]
    pub fn with_memory(mut self, memory: Arc<dyn MemoryManager>) -> Self {
        self.memory = memory;
        self
    }

    /// Set the bounds of the stream the source runs in.
    #[must_use]
    pub fn with_bounds(mut self, bounds: ResolvedBounds) -> Self {
        self.bounds = Some(bounds);
        self
    }

    /// The current user; a query may legitimately run without one.
    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn memory(&self) -> &Arc<dyn MemoryManager> {
        &self.memory
    }

    /// Stream bounds, if the query set any.
    pub fn bounds(&self) -> Option<ResolvedBounds> {
        self.bounds
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tidal_core::Time;

    #[test]
    fn test_runtime_config_from_execution_config() {
        let exec = ExecutionConfig {
            auth_enabled: true,
            read_error_policy: ReadErrorPolicy::FailFast,
            memory_limit: Some(1024),
        };
        let config = RuntimeConfig::from(&exec);
        assert_eq!(config.read_error_policy, ReadErrorPolicy::FailFast);
        assert_eq!(config.memory_limit, Some(1024));
    }

    #[test]
    fn test_context_memory_follows_config() {
        let ctx = ExecutionContext::with_config(RuntimeConfig::default().with_memory_limit(64));
        assert_eq!(ctx.memory().limit(), Some(64));
        assert!(ctx.user().is_none());
        assert!(ctx.bounds().is_none());

        let ctx = ExecutionContext::new()
            .with_user(User::new("alice"))
            .with_bounds(ResolvedBounds::new(Time::ZERO, Time::from_nanos(10)));
        assert_eq!(ctx.user().map(|u| u.name.as_str()), Some("alice"));
        assert!(ctx.bounds().is_some());
        assert!(!ctx.cancellation().is_cancelled());
    }
}
