//! Regrouping.

use serde::{Deserialize, Serialize};

use tidal_core::GroupMode;

/// Regroup tables by (or except) a list of columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSpec {
    /// Grouping mode.
    pub mode: GroupMode,
    /// Ordered group columns.
    pub keys: Vec<String>,
}

impl GroupSpec {
    /// Group by the given columns.
    pub fn by<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            mode: GroupMode::By,
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    /// Group by every column except the given ones.
    pub fn except<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            mode: GroupMode::Except,
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }
}
