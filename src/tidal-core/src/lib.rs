//! Core types shared by the Tidal planning and execution crates.
//!
//! - [`types`]: the signed nanosecond time domain, bounds, windows and group modes
//! - [`labels`]: reserved column names of storage tables
//! - [`DatasetId`]: identifier of a running source

pub mod ids;
pub mod labels;
pub mod types;

pub use ids::DatasetId;
pub use types::{Bounds, Duration, GroupMode, ResolvedBounds, Time, TimeSpec, Window};
