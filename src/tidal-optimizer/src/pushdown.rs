//! Predicate pushdown analysis.
//!
//! Splits a filter body into the conjunction storage can evaluate and the
//! residual the engine must keep. Storage evaluates comparisons of the form
//! `r.property <op> literal` where `r` is the predicate's parameter:
//!
//! | property   | operators                           |
//! |------------|-------------------------------------|
//! | tag        | `==`, `!=`, `=~`, `!~`              |
//! | `_value`   | the tag operators and `<`, `<=`, `>`, `>=` |
//!
//! Only `and` is split. An `or` or `not` keeps its whole subtree in the
//! residual, even when every leaf below it is pushable on its own.

use tidal_core::labels::DEFAULT_VALUE_COL;
use tidal_plan::expr::{BinaryOp, Expr, conjunction, flatten_conjunction};

/// Split `expr` into `(pushable, residual)` conjunctions over parameter `param`.
///
/// Clauses keep their relative order on both sides. Either side is `None`
/// when no clause landed there.
pub fn partition_predicate(param: &str, expr: &Expr) -> (Option<Expr>, Option<Expr>) {
    let (pushable, residual): (Vec<&Expr>, Vec<&Expr>) = flatten_conjunction(expr)
        .into_iter()
        .partition(|clause| is_pushable(param, clause));

    (
        conjunction(pushable.into_iter().cloned()),
        conjunction(residual.into_iter().cloned()),
    )
}

/// Whether storage can evaluate the single comparison `expr`.
pub fn is_pushable(param: &str, expr: &Expr) -> bool {
    let Expr::Binary { left, op, right } = expr else {
        return false;
    };
    let Expr::Literal(literal) = right.as_ref() else {
        return false;
    };
    if !literal.is_storage_comparable() {
        return false;
    }
    match left.as_member_of_identifier() {
        Some((object, property)) if object == param => is_pushable_operator(property, *op),
        _ => false,
    }
}

fn is_pushable_operator(property: &str, op: BinaryOp) -> bool {
    if property == DEFAULT_VALUE_COL {
        op.is_equality() || op.is_ordering()
    } else {
        op.is_equality()
    }
}
