//! Result output.

use serde::{Deserialize, Serialize};

/// Publish the input tables under a result name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YieldSpec {
    /// Result name.
    pub name: String,
}

impl YieldSpec {
    /// Create a named output.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for YieldSpec {
    fn default() -> Self {
        Self::new("_result")
    }
}
