//! Error types and result aliases for Tidal.
//!
//! Every crate in the workspace reports failures through [`TidalError`] so
//! planning, validation and execution failures surface with one taxonomy.

mod error;

pub use error::{GenericError, TidalError, TidalResult};
