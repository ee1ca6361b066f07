//! Execution of storage reads for Tidal.
//!
//! [`create_from_source`] turns a finalized [`PhysicalReadSpec`] into a
//! [`StorageSource`]: it resolves the bucket into a database and retention
//! policy, authorizes the read and derives the window schedule. Running the
//! source reads the bounded interval window by window and pushes every table
//! into the registered [`Transformation`]s.
//!
//! ```text
//! PhysicalReadSpec ──▶ create_from_source ──▶ StorageSource::run
//!                          │                      │
//!                   MetaClient, Authorizer     Reader ──▶ Transformation*
//! ```
//!
//! [`PhysicalReadSpec`]: tidal_plan::PhysicalReadSpec

mod context;
mod deps;
mod from;
mod metrics;
mod source;
mod transformation;

pub use context::{ExecutionContext, RuntimeConfig};
pub use deps::FromDependencies;
pub use from::{create_from_source, split_bucket};
pub use metrics::SourceMetrics;
pub use source::{Source, StorageSource};
pub use transformation::Transformation;
