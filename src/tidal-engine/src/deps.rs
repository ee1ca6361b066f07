//! Collaborators a storage source is built from.

use std::sync::Arc;

use common_config::ExecutionConfig;
use common_error::{TidalError, TidalResult};
use tidal_storage::{Authorizer, MetaClient, Reader};

/// Typed dependencies of source construction.
#[derive(Clone)]
pub struct FromDependencies {
    pub reader: Arc<dyn Reader>,
    pub meta_client: Arc<dyn MetaClient>,
    /// Required when `auth_enabled` is set.
    pub authorizer: Option<Arc<dyn Authorizer>>,
    pub auth_enabled: bool,
}

impl std::fmt::Debug for FromDependencies {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FromDependencies")
            .field("authorizer", &self.authorizer.is_some())
            .field("auth_enabled", &self.auth_enabled)
            .finish_non_exhaustive()
    }
}

impl FromDependencies {
    /// Dependencies with authorization disabled.
    pub fn new(reader: Arc<dyn Reader>, meta_client: Arc<dyn MetaClient>) -> Self {
        Self {
            reader,
            meta_client,
            authorizer: None,
            auth_enabled: false,
        }
    }

    /// Enable authorization through `authorizer`.
    #[must_use]
    pub fn with_authorizer(mut self, authorizer: Arc<dyn Authorizer>) -> Self {
        self.authorizer = Some(authorizer);
        self.auth_enabled = true;
        self
    }

    /// Take the auth flag from the execution configuration.
    #[must_use]
    pub fn with_config(mut self, config: &ExecutionConfig) -> Self {
        self.auth_enabled = config.auth_enabled;
        self
    }

    /// Reject a bag that enables authorization without an authorizer.
    pub fn validate(&self) -> TidalResult<()> {
        if self.auth_enabled && self.authorizer.is_none() {
            return Err(TidalError::invalid_config(
                "authorization is enabled but no authorizer is configured",
            ));
        }
        Ok(())
    }
}
