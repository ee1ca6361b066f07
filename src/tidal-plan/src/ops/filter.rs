//! Row predicate.

use serde::{Deserialize, Serialize};

use crate::expr::FunctionExpr;

/// Keep rows for which the predicate function returns true.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    /// Predicate over one row parameter.
    pub func: FunctionExpr,
}

impl FilterSpec {
    /// Create a filter.
    pub const fn new(func: FunctionExpr) -> Self {
        Self { func }
    }
}
