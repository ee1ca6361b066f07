//! Typed identifiers shared across execution components.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a dataset produced by a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct DatasetId(
    /// Raw numeric id value.
    pub u64,
);

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dataset-{}", self.0)
    }
}
