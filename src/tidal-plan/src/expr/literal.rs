//! Literal values.

use serde::{Deserialize, Serialize};

use tidal_core::{Duration, Time};

/// A literal appearing in a predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    /// String literal.
    String(String),
    /// Signed integer literal.
    Integer(i64),
    /// Floating point literal.
    Float(f64),
    /// Boolean literal.
    Boolean(bool),
    /// Regular expression literal.
    Regex(String),
    /// Instant literal.
    DateTime(Time),
    /// Duration literal.
    Duration(Duration),
}

impl Literal {
    /// Whether the storage layer can compare against this literal.
    pub const fn is_storage_comparable(&self) -> bool {
        matches!(
            self,
            Self::String(_) | Self::Integer(_) | Self::Float(_) | Self::Boolean(_) | Self::Regex(_)
        )
    }
}

impl std::fmt::Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::String(s) => write!(f, "{s:?}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v:?}"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Regex(r) => write!(f, "/{r}/"),
            Self::DateTime(t) => write!(f, "time({t})"),
            Self::Duration(d) => write!(f, "{d}"),
        }
    }
}

impl From<&str> for Literal {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Literal {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for Literal {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<f64> for Literal {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for Literal {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<Time> for Literal {
    fn from(t: Time) -> Self {
        Self::DateTime(t)
    }
}

impl From<Duration> for Literal {
    fn from(d: Duration) -> Self {
        Self::Duration(d)
    }
}
