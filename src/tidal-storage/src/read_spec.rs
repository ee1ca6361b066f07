//! Storage read request.

use serde::{Deserialize, Serialize};

use tidal_plan::FunctionExpr;

/// How storage partitions series into tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupMode {
    /// Storage default, which is one table per series.
    #[default]
    Default,
    /// Merge every series into a single table.
    None,
    /// One table per series.
    All,
    /// One table per distinct value of the group keys.
    By,
    /// One table per distinct value of every key except the group keys.
    Except,
}

impl From<tidal_core::GroupMode> for GroupMode {
    fn from(mode: tidal_core::GroupMode) -> Self {
        match mode {
            tidal_core::GroupMode::None => Self::Default,
            tidal_core::GroupMode::All => Self::All,
            tidal_core::GroupMode::By => Self::By,
            tidal_core::GroupMode::Except => Self::Except,
        }
    }
}

/// A read against one database and retention policy.
///
/// Time bounds are not part of the spec; they are passed per window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadSpec {
    pub database: String,
    pub retention_policy: String,

    /// Memory budget hint for the read, in bytes. Zero means unlimited.
    pub ram_limit: u64,
    /// Storage hosts to read from. Empty means all.
    pub hosts: Vec<String>,

    /// Row predicate storage evaluates.
    pub predicate: Option<FunctionExpr>,
    /// Points per series; `-1` reads the first point only, zero is unlimited.
    pub points_limit: i64,
    pub series_limit: i64,
    pub series_offset: i64,
    pub descending: bool,

    /// Aggregate storage applies per table. Empty for raw points.
    pub aggregate_method: String,

    /// Produce every series for a time before moving to a later time.
    pub order_by_time: bool,
    pub group_mode: GroupMode,
    /// Dimensions to group by, or to exclude, depending on `group_mode`.
    pub group_keys: Vec<String>,
}

impl ReadSpec {
    /// Read of `database` / `retention_policy` with nothing pushed down.
    pub fn new(database: impl Into<String>, retention_policy: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            retention_policy: retention_policy.into(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_mode_mapping() {
        assert_eq!(GroupMode::from(tidal_core::GroupMode::None), GroupMode::Default);
        assert_eq!(GroupMode::from(tidal_core::GroupMode::All), GroupMode::All);
        assert_eq!(GroupMode::from(tidal_core::GroupMode::By), GroupMode::By);
        assert_eq!(GroupMode::from(tidal_core::GroupMode::Except), GroupMode::Except);
    }

    #[test]
    fn test_read_spec_defaults() {
        let spec = ReadSpec::new("telegraf", "autogen");
        assert_eq!(spec.ram_limit, 0);
        assert!(spec.hosts.is_empty());
        assert_eq!(spec.group_mode, GroupMode::Default);

        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["retentionPolicy"], "autogen");
        assert_eq!(json["groupMode"], "default");
    }
}
