//! Database authorization.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use common_error::{TidalError, TidalResult};

/// Access level on a database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Privilege {
    Read,
    Write,
    All,
}

impl Privilege {
    /// Whether holding `self` grants `wanted`.
    pub const fn grants(self, wanted: Self) -> bool {
        matches!(
            (self, wanted),
            (Self::All, _) | (Self::Read, Self::Read) | (Self::Write, Self::Write)
        )
    }
}

/// An authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    /// Admins hold every privilege on every database.
    pub admin: bool,
}

impl User {
    /// A regular user.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            admin: false,
        }
    }

    /// An admin user.
    pub fn admin(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            admin: true,
        }
    }
}

/// Decides whether a user may access a database.
pub trait Authorizer: Send + Sync {
    /// Authorize `privilege` on `database`, failing with `Unauthorized`.
    fn authorize_database(&self, user: &User, privilege: Privilege, database: &str)
    -> TidalResult<()>;
}

/// Authorizer backed by a fixed grant table.
#[derive(Debug, Clone, Default)]
pub struct StaticAuthorizer {
    grants: HashMap<String, HashSet<(String, Privilege)>>,
}

impl StaticAuthorizer {
    /// Create an authorizer with no grants.
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant `privilege` on `database` to `user`.
    #[must_use]
    pub fn grant(
        mut self,
        user: impl Into<String>,
        database: impl Into<String>,
        privilege: Privilege,
    ) -> Self {
        self.grants
            .entry(user.into())
            .or_default()
            .insert((database.into(), privilege));
        self
    }
}

impl Authorizer for StaticAuthorizer {
    fn authorize_database(
        &self,
        user: &User,
        privilege: Privilege,
        database: &str,
    ) -> TidalResult<()> {
        if user.admin {
            return Ok(());
        }
        let granted = self.grants.get(&user.name).is_some_and(|grants| {
            grants
                .iter()
                .any(|(db, held)| db == database && held.grants(privilege))
        });
        if granted {
            Ok(())
        } else {
            Err(TidalError::unauthorized(format!(
                "user {} is not authorized to {privilege:?} database {database}",
                user.name
            )))
        }
    }
}
