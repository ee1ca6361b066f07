//! Expression tree.

use serde::{Deserialize, Serialize};

use super::{BinaryOp, Literal, LogicalOperator, UnaryOp};

/// An expression in a predicate body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// Reference to a function parameter or variable.
    Identifier(String),
    /// Property access `object.property`.
    Member {
        object: Box<Expr>,
        property: String,
    },
    /// Literal value.
    Literal(Literal),
    /// Comparison or arithmetic.
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
    /// Boolean connective.
    Logical {
        left: Box<Expr>,
        op: LogicalOperator,
        right: Box<Expr>,
    },
    /// Unary operation.
    Unary { op: UnaryOp, expr: Box<Expr> },
    /// Function call.
    Call { callee: String, args: Vec<Expr> },
}

impl Expr {
    /// Create a member access expression.
    pub fn member(object: Expr, property: impl Into<String>) -> Self {
        Self::Member {
            object: Box::new(object),
            property: property.into(),
        }
    }

    /// Create a binary expression.
    pub fn binary(left: Expr, op: BinaryOp, right: Expr) -> Self {
        Self::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    /// Create a logical expression.
    pub fn logical(left: Expr, op: LogicalOperator, right: Expr) -> Self {
        Self::Logical {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    /// Create a function call expression.
    pub fn call(callee: impl Into<String>, args: Vec<Expr>) -> Self {
        Self::Call {
            callee: callee.into(),
            args,
        }
    }

    // Comparison operators

    /// `self == other`
    #[must_use]
    pub fn equals(self, other: Expr) -> Self {
        Self::binary(self, BinaryOp::Eq, other)
    }

    /// `self != other`
    #[must_use]
    pub fn not_equals(self, other: Expr) -> Self {
        Self::binary(self, BinaryOp::NotEq, other)
    }

    /// `self < other`
    #[must_use]
    pub fn lt(self, other: Expr) -> Self {
        Self::binary(self, BinaryOp::Lt, other)
    }

    /// `self <= other`
    #[must_use]
    pub fn lt_eq(self, other: Expr) -> Self {
        Self::binary(self, BinaryOp::LtEq, other)
    }

    /// `self > other`
    #[must_use]
    pub fn gt(self, other: Expr) -> Self {
        Self::binary(self, BinaryOp::Gt, other)
    }

    /// `self >= other`
    #[must_use]
    pub fn gt_eq(self, other: Expr) -> Self {
        Self::binary(self, BinaryOp::GtEq, other)
    }

    /// `self =~ other`
    #[must_use]
    pub fn regex_match(self, other: Expr) -> Self {
        Self::binary(self, BinaryOp::RegexMatch, other)
    }

    /// `self !~ other`
    #[must_use]
    pub fn not_regex_match(self, other: Expr) -> Self {
        Self::binary(self, BinaryOp::NotRegexMatch, other)
    }

    // Logical operators

    /// `self and other`
    #[must_use]
    pub fn and(self, other: Expr) -> Self {
        Self::logical(self, LogicalOperator::And, other)
    }

    /// `self or other`
    #[must_use]
    pub fn or(self, other: Expr) -> Self {
        Self::logical(self, LogicalOperator::Or, other)
    }

    /// `not self`
    #[must_use]
    pub fn negated(self) -> Self {
        Self::Unary {
            op: UnaryOp::Not,
            expr: Box::new(self),
        }
    }

    /// If this is `ident.property`, return `(ident, property)`.
    pub fn as_member_of_identifier(&self) -> Option<(&str, &str)> {
        match self {
            Self::Member { object, property } => match object.as_ref() {
                Self::Identifier(name) => Some((name.as_str(), property.as_str())),
                _ => None,
            },
            _ => None,
        }
    }
}

/// Join expressions with `and`, left to right. `None` when `exprs` is empty.
pub fn conjunction(exprs: impl IntoIterator<Item = Expr>) -> Option<Expr> {
    exprs.into_iter().reduce(Expr::and)
}

/// Split the `and`-joined operands of `expr`, left to right.
///
/// Only `and` nodes are descended; any other node is one operand.
pub fn flatten_conjunction(expr: &Expr) -> Vec<&Expr> {
    let mut out = Vec::new();
    let mut stack = vec![expr];
    while let Some(e) = stack.pop() {
        match e {
            Expr::Logical {
                left,
                op: LogicalOperator::And,
                right,
            } => {
                stack.push(right);
                stack.push(left);
            }
            other => out.push(other),
        }
    }
    out
}

impl std::fmt::Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Identifier(name) => write!(f, "{name}"),
            Self::Member { object, property } => write!(f, "{object}.{property}"),
            Self::Literal(lit) => write!(f, "{lit}"),
            Self::Binary { left, op, right } => write!(f, "{left} {op} {right}"),
            Self::Logical { left, op, right } => write!(f, "({left} {op} {right})"),
            Self::Unary { op, expr } => write!(f, "{op}{expr}"),
            Self::Call { callee, args } => {
                write!(f, "{callee}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
        }
    }
}
