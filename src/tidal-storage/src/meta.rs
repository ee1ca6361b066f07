//! Metadata catalog of databases and retention policies.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A retention policy of a database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionPolicyInfo {
    pub name: String,
}

/// A database and its retention policies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseInfo {
    pub name: String,
    /// Policy used when a bucket names only the database.
    pub default_retention_policy: String,
    pub retention_policies: Vec<RetentionPolicyInfo>,
}

impl DatabaseInfo {
    /// A database with the given policies; the first one is the default.
    pub fn new<I, S>(name: impl Into<String>, policies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let retention_policies: Vec<_> = policies
            .into_iter()
            .map(|p| RetentionPolicyInfo { name: p.into() })
            .collect();
        let default_retention_policy = retention_policies
            .first()
            .map(|p| p.name.clone())
            .unwrap_or_default();
        Self {
            name: name.into(),
            default_retention_policy,
            retention_policies,
        }
    }

    /// Override the default retention policy.
    #[must_use]
    pub fn with_default_retention_policy(mut self, name: impl Into<String>) -> Self {
        self.default_retention_policy = name.into();
        self
    }

    /// Look up a retention policy by name.
    pub fn retention_policy(&self, name: &str) -> Option<&RetentionPolicyInfo> {
        self.retention_policies.iter().find(|p| p.name == name)
    }
}

/// Read access to the metadata catalog.
pub trait MetaClient: Send + Sync {
    /// Look up a database by name.
    fn database(&self, name: &str) -> Option<DatabaseInfo>;
}

/// Catalog held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryMetaClient {
    databases: HashMap<String, DatabaseInfo>,
}

impl MemoryMetaClient {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a database, replacing any with the same name.
    #[must_use]
    pub fn with_database(mut self, info: DatabaseInfo) -> Self {
        self.databases.insert(info.name.clone(), info);
        self
    }
}

impl MetaClient for MemoryMetaClient {
    fn database(&self, name: &str) -> Option<DatabaseInfo> {
        self.databases.get(name).cloned()
    }
}
