//! Display utilities for Tidal.
//!
//! Provides tree rendering for plan explain output.

mod tree;

pub use tree::DisplayTree;
