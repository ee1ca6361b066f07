//! Configuration management for Tidal.
//!
//! Provides planner and execution configuration for storage reads.

use serde::{Deserialize, Serialize};

/// Global Tidal configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TidalConfig {
    /// Plan rewrite configuration.
    pub planner: PlannerConfig,
    /// Execution configuration.
    pub execution: ExecutionConfig,
}

/// Plan rewrite configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Maximum number of fixed-point iterations before the rewriter stops.
    pub max_iterations: usize,
    /// Record a before/after trace of every rule application.
    pub enable_trace: bool,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            enable_trace: false,
        }
    }
}

/// Execution configuration for storage sources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Require an authorized user for every storage read.
    pub auth_enabled: bool,
    /// What a source does when the storage reader fails.
    pub read_error_policy: ReadErrorPolicy,
    /// Memory limit in bytes for in-flight tables.
    pub memory_limit: Option<usize>,
}

/// Policy applied when a storage read fails mid-stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadErrorPolicy {
    /// Log the error and end the stream; consumers finish without an error.
    #[default]
    BestEffort,
    /// Propagate the error to every consumer's finish signal.
    FailFast,
}

impl ReadErrorPolicy {
    /// Whether reader errors are reported to consumers.
    pub const fn propagates(self) -> bool {
        matches!(self, Self::FailFast)
    }
}
