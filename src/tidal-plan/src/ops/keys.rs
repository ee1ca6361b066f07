//! Group key listing.

use serde::{Deserialize, Serialize};

/// List the group key columns of each table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeysSpec {
    /// Columns left out of the listing.
    pub except: Vec<String>,
}
