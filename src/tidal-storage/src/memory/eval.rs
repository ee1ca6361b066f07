//! Point-wise predicate evaluation for the in-memory reader.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use common_error::{TidalError, TidalResult};
use regex::Regex;
use tidal_core::labels::DEFAULT_VALUE_COL;
use tidal_plan::FunctionExpr;
use tidal_plan::expr::{BinaryOp, Expr, Literal, LogicalOperator, UnaryOp};

/// A point as seen by a predicate: its series tags and its value.
#[derive(Debug, Clone, Copy)]
pub struct PointRow<'a> {
    pub tags: &'a BTreeMap<String, String>,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Value<'a> {
    Str(&'a str),
    Float(f64),
    Bool(bool),
}

/// Evaluates a pushed-down predicate against single points.
///
/// Regex literals are compiled once, when the evaluator is built.
#[derive(Debug)]
pub struct PointEvaluator<'e> {
    param: &'e str,
    body: &'e Expr,
    patterns: HashMap<&'e str, Regex>,
}

impl<'e> PointEvaluator<'e> {
    /// Prepare `func` for evaluation; it must declare exactly one parameter.
    pub fn new(func: &'e FunctionExpr) -> TidalResult<Self> {
        let param = func.single_param().ok_or_else(|| {
            TidalError::storage(format!(
                "predicate must declare one parameter, found {}",
                func.params.len()
            ))
        })?;
        let mut patterns = HashMap::new();
        compile_patterns(&func.body, &mut patterns)?;
        Ok(Self {
            param,
            body: &func.body,
            patterns,
        })
    }

    /// Whether the point satisfies the predicate.
    pub fn matches(&self, row: PointRow<'_>) -> TidalResult<bool> {
        match self.evaluate(self.body, row)? {
            Value::Bool(b) => Ok(b),
            other => Err(TidalError::storage(format!(
                "predicate evaluated to non-boolean {other:?}"
            ))),
        }
    }

    fn evaluate<'a>(&self, expr: &'a Expr, row: PointRow<'a>) -> TidalResult<Value<'a>> {
        match expr {
            Expr::Member { .. } => self.eval_member(expr, row),
            Expr::Literal(literal) => eval_literal(literal),
            Expr::Binary {
                left,
                op: op @ (BinaryOp::RegexMatch | BinaryOp::NotRegexMatch),
                right,
            } => {
                let matched = self.eval_regex(left, right, row)?;
                Ok(Value::Bool(matched == (*op == BinaryOp::RegexMatch)))
            }
            Expr::Binary { left, op, right } => {
                let left = self.evaluate(left, row)?;
                let right = self.evaluate(right, row)?;
                eval_comparison(left, *op, right).map(Value::Bool)
            }
            Expr::Logical { left, op, right } => {
                let left = self.eval_bool(left, row)?;
                // Short-circuit like the query engine does.
                let result = match op {
                    LogicalOperator::And => left && self.eval_bool(right, row)?,
                    LogicalOperator::Or => left || self.eval_bool(right, row)?,
                };
                Ok(Value::Bool(result))
            }
            Expr::Unary {
                op: UnaryOp::Not,
                expr,
            } => Ok(Value::Bool(!self.eval_bool(expr, row)?)),
            other => Err(TidalError::storage(format!(
                "unsupported predicate expression: {other}"
            ))),
        }
    }

    fn eval_bool(&self, expr: &Expr, row: PointRow<'_>) -> TidalResult<bool> {
        match self.evaluate(expr, row)? {
            Value::Bool(b) => Ok(b),
            other => Err(TidalError::storage(format!(
                "expected a boolean operand, found {other:?}"
            ))),
        }
    }

    fn eval_regex(&self, left: &Expr, right: &Expr, row: PointRow<'_>) -> TidalResult<bool> {
        let Expr::Literal(Literal::Regex(pattern)) = right else {
            return Err(TidalError::storage(format!(
                "right side of a regex match must be a regex literal, found {right}"
            )));
        };
        let re = self
            .patterns
            .get(pattern.as_str())
            .ok_or_else(|| TidalError::internal(format!("regex /{pattern}/ was not compiled")))?;
        match self.evaluate(left, row)? {
            Value::Str(s) => Ok(re.is_match(s)),
            other => Err(TidalError::storage(format!(
                "regex match needs a string operand, found {other:?}"
            ))),
        }
    }

    fn eval_member<'a>(&self, expr: &'a Expr, row: PointRow<'a>) -> TidalResult<Value<'a>> {
        match expr.as_member_of_identifier() {
            Some((object, property)) if object == self.param => {
                if property == DEFAULT_VALUE_COL {
                    Ok(Value::Float(row.value))
                } else {
                    // A missing tag reads as the empty string.
                    Ok(Value::Str(row.tags.get(property).map_or("", String::as_str)))
                }
            }
            _ => Err(TidalError::storage(format!(
                "unsupported column reference: {expr}"
            ))),
        }
    }
}

fn compile_patterns<'e>(expr: &'e Expr, out: &mut HashMap<&'e str, Regex>) -> TidalResult<()> {
    match expr {
        Expr::Literal(Literal::Regex(pattern)) if !out.contains_key(pattern.as_str()) => {
            let re = Regex::new(pattern).map_err(|e| {
                TidalError::storage(format!("invalid regex /{pattern}/: {e}"))
            })?;
            out.insert(pattern.as_str(), re);
        }
        Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
            compile_patterns(left, out)?;
            compile_patterns(right, out)?;
        }
        Expr::Unary { expr, .. } => compile_patterns(expr, out)?,
        _ => {}
    }
    Ok(())
}

#[allow(clippy::cast_precision_loss)]
fn eval_literal(literal: &Literal) -> TidalResult<Value<'_>> {
    match literal {
        Literal::String(s) => Ok(Value::Str(s)),
        Literal::Integer(i) => Ok(Value::Float(*i as f64)),
        Literal::Float(f) => Ok(Value::Float(*f)),
        Literal::Boolean(b) => Ok(Value::Bool(*b)),
        Literal::Regex(pattern) => Err(TidalError::storage(format!(
            "regex /{pattern}/ can only appear on the right of =~ or !~"
        ))),
        other => Err(TidalError::storage(format!(
            "literal {other} cannot be compared by storage"
        ))),
    }
}

fn eval_comparison(left: Value<'_>, op: BinaryOp, right: Value<'_>) -> TidalResult<bool> {
    let ordering = match (left, right) {
        (Value::Str(l), Value::Str(r)) => Some(l.cmp(r)),
        (Value::Float(l), Value::Float(r)) => l.partial_cmp(&r),
        (Value::Bool(l), Value::Bool(r)) => Some(l.cmp(&r)),
        // Mismatched types never compare equal.
        _ => None,
    };

    Ok(match op {
        BinaryOp::Eq => ordering == Some(Ordering::Equal),
        BinaryOp::NotEq => ordering != Some(Ordering::Equal),
        BinaryOp::Lt => ordering == Some(Ordering::Less),
        BinaryOp::LtEq => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
        BinaryOp::Gt => ordering == Some(Ordering::Greater),
        BinaryOp::GtEq => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
        other => {
            return Err(TidalError::storage(format!(
                "operator {other} is not supported by the in-memory reader"
            )));
        }
    })
}
