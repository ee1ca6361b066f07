//! Predicate functions.

use serde::{Deserialize, Serialize};

use super::Expr;

/// A function literal such as `(r) => r.host == "a"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionExpr {
    /// Declared parameter names.
    pub params: Vec<String>,
    /// Function body.
    pub body: Expr,
}

impl FunctionExpr {
    /// Create a function with the given parameters.
    pub fn new(params: Vec<String>, body: Expr) -> Self {
        Self { params, body }
    }

    /// Create a single-parameter predicate.
    pub fn predicate(param: impl Into<String>, body: Expr) -> Self {
        Self {
            params: vec![param.into()],
            body,
        }
    }

    /// The parameter name when exactly one is declared.
    pub fn single_param(&self) -> Option<&str> {
        match self.params.as_slice() {
            [p] => Some(p.as_str()),
            _ => None,
        }
    }

    /// Copy of this function with a different body.
    #[must_use]
    pub fn with_body(&self, body: Expr) -> Self {
        Self {
            params: self.params.clone(),
            body,
        }
    }
}

impl std::fmt::Display for FunctionExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}) => {}", self.params.join(", "), self.body)
    }
}
