//! Time range restriction.

use serde::{Deserialize, Serialize};

use tidal_core::{Bounds, ResolvedBounds};

/// Restrict rows to a time range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeSpec {
    /// Range bounds, possibly relative to their reference instant.
    pub bounds: Bounds,
}

impl RangeSpec {
    /// Create a range.
    pub const fn new(bounds: Bounds) -> Self {
        Self { bounds }
    }

    /// Absolute bounds of the range.
    pub const fn resolved(&self) -> ResolvedBounds {
        self.bounds.resolve()
    }
}
