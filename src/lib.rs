//! Tidal: storage read planning and windowed streaming execution.
//!
//! A query's storage read starts as a logical `from` node in a
//! [`plan::PlanGraph`]. The [`optimizer`] pushes adjacent range, filter,
//! group, distinct and keys operations into a single physical read and
//! validates that it is bounded. The [`engine`] turns that read into a
//! source which reads the interval window by window from a
//! [`storage::Reader`] and feeds downstream consumers.

#![forbid(unsafe_code)]

pub use common_config as config;
pub use common_error as error;
pub use tidal_core as core;
pub use tidal_engine as engine;
pub use tidal_optimizer as optimizer;
pub use tidal_plan as plan;
pub use tidal_storage as storage;

pub use common_error::{TidalError, TidalResult};

/// Tidal version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
