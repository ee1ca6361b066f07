//! Query plan model for Tidal.
//!
//! - [`expr`]: predicate expressions and single-parameter functions
//! - [`ops`]: procedure specs, one tagged variant per node kind
//! - [`read`]: the physical read specification rules push state into
//! - [`graph`]: the plan graph, addressed by stable [`NodeId`]s
//! - [`pattern`]: kind patterns and typed rule matches

pub mod expr;
pub mod graph;
pub mod ops;
pub mod pattern;
pub mod read;

pub use expr::{Expr, FunctionExpr, Literal};
pub use graph::{NodeId, PlanGraph, PlanNode};
pub use ops::{BucketRef, FromOpSpec, FromSpec, ProcedureKind, ProcedureSpec};
pub use pattern::{Pattern, Procedure, ReadMatch};
pub use read::{FIRST_POINT_ONLY, PhysicalReadSpec};
