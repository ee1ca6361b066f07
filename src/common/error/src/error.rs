//! Core error types for Tidal.

use thiserror::Error;

/// Result type alias using `TidalError`.
pub type TidalResult<T> = std::result::Result<T, TidalError>;

/// Generic boxed error for external error sources.
pub type GenericError = Box<dyn std::error::Error + Send + Sync>;

/// Core error type for Tidal operations.
///
/// Classification:
/// - [`TidalError::InvalidConfig`]: operation arguments rejected before planning
/// - [`TidalError::PlanningError`]: plan graph surgery failed, planning aborts
/// - [`TidalError::ValidationError`]: a finalized plan is not executable
/// - [`TidalError::Unauthorized`]: trust-boundary failures (no user, denied privilege)
/// - [`TidalError::NotFound`]: data-existence failures (database, retention policy)
/// - [`TidalError::Unsupported`]: valid request this backend does not serve
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TidalError {
    /// Invalid or inconsistent operation arguments.
    #[error("InvalidConfig: {0}")]
    InvalidConfig(String),

    /// Plan rewrite failure.
    #[error("PlanningError: {0}")]
    PlanningError(String),

    /// A plan failed validation.
    #[error("ValidationError: {0}")]
    ValidationError(String),

    /// Missing user or denied privilege.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Catalog entry does not exist.
    #[error("NotFound: {0}")]
    NotFound(String),

    /// Feature not supported by this backend.
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// Query execution error.
    #[error("ExecutionError: {0}")]
    ExecutionError(String),

    /// Storage layer error.
    #[error("StorageError: {0}")]
    StorageError(String),

    /// Internal error (bug in Tidal).
    #[error("InternalError: {0}")]
    InternalError(String),

    /// IO error.
    #[error("IoError: {0}")]
    IoError(#[from] std::io::Error),

    /// Arrow error.
    #[error("ArrowError: {0}")]
    ArrowError(#[from] arrow_schema::ArrowError),

    /// JSON serialization error.
    #[error("SerdeJsonError: {0}")]
    SerdeJsonError(#[from] serde_json::Error),

    /// External error from third-party libraries.
    #[error("ExternalError: {0}")]
    ExternalError(GenericError),
}

impl TidalError {
    /// Create a new `InvalidConfig` error.
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a new `PlanningError`.
    pub fn planning<S: Into<String>>(msg: S) -> Self {
        Self::PlanningError(msg.into())
    }

    /// Create a new `ValidationError`.
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::ValidationError(msg.into())
    }

    /// Create a new `Unauthorized` error.
    pub fn unauthorized<S: Into<String>>(msg: S) -> Self {
        Self::Unauthorized(msg.into())
    }

    /// Create a new `NotFound` error.
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a new `Unsupported` error.
    pub fn unsupported<S: Into<String>>(msg: S) -> Self {
        Self::Unsupported(msg.into())
    }

    /// Create a new `ExecutionError`.
    pub fn execution<S: Into<String>>(msg: S) -> Self {
        Self::ExecutionError(msg.into())
    }

    /// Create a new `StorageError`.
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        Self::StorageError(msg.into())
    }

    /// Create a new `InternalError`.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::InternalError(msg.into())
    }

    /// Create a cancellation error (using `ExecutionError`).
    pub fn cancelled<S: Into<String>>(msg: S) -> Self {
        Self::ExecutionError(format!("Cancelled: {}", msg.into()))
    }

    /// Create a resource exhausted error (using `ExecutionError`).
    pub fn resource_exhausted<S: Into<String>>(msg: S) -> Self {
        Self::ExecutionError(format!("ResourceExhausted: {}", msg.into()))
    }

    /// Whether this error comes from the trust boundary.
    pub const fn is_authorization(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }

    /// Whether this error reports a missing catalog entry.
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Ensure a condition holds, returning an `ExecutionError` if not.
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $msg:expr) => {
        if !$cond {
            return Err($crate::TidalError::ExecutionError($msg.to_string()));
        }
    };
    ($cond:expr, $variant:ident: $($msg:tt)*) => {
        if !$cond {
            return Err($crate::TidalError::$variant(format!($($msg)*)));
        }
    };
}
