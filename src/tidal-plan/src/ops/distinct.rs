//! Distinct values of a column.

use serde::{Deserialize, Serialize};

use tidal_core::labels::DEFAULT_VALUE_COL;

/// Emit the distinct values of one column per table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistinctSpec {
    /// Column whose values are deduplicated.
    pub column: String,
}

impl DistinctSpec {
    /// Distinct over `column`.
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
        }
    }
}

impl Default for DistinctSpec {
    fn default() -> Self {
        Self::new(DEFAULT_VALUE_COL)
    }
}
