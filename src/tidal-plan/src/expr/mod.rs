//! Predicate expression system.
//!
//! Filter predicates are single-parameter functions such as
//! `(r) => r._value > 5 and r.host == "a"`. The body is an [`Expr`] tree in
//! which the parameter appears as an identifier and row columns as member
//! accesses on it.

mod expr;
mod function;
mod literal;
mod operator;

pub use expr::{Expr, conjunction, flatten_conjunction};
pub use function::FunctionExpr;
pub use literal::Literal;
pub use operator::{BinaryOp, LogicalOperator, UnaryOp};

/// Create an identifier expression.
pub fn ident(name: impl Into<String>) -> Expr {
    Expr::Identifier(name.into())
}

/// Create a member access `object.property` on an identifier.
pub fn member(object: impl Into<String>, property: impl Into<String>) -> Expr {
    Expr::member(ident(object), property)
}

/// Create a literal expression.
pub fn lit(value: impl Into<Literal>) -> Expr {
    Expr::Literal(value.into())
}

/// Create a regular expression literal.
pub fn regex(pattern: impl Into<String>) -> Expr {
    Expr::Literal(Literal::Regex(pattern.into()))
}
