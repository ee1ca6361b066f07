//! Grouping modes of a read.

use serde::{Deserialize, Serialize};

/// How the rows of a read are partitioned into tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupMode {
    /// No explicit grouping.
    #[default]
    None,
    /// One table per series.
    All,
    /// One table per distinct value of the group keys.
    By,
    /// One table per distinct value of every key except the group keys.
    Except,
}

impl GroupMode {
    /// Whether the mode is parameterized by a key list.
    pub const fn uses_keys(self) -> bool {
        matches!(self, Self::By | Self::Except)
    }
}

impl std::fmt::Display for GroupMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::All => write!(f, "all"),
            Self::By => write!(f, "by"),
            Self::Except => write!(f, "except"),
        }
    }
}
