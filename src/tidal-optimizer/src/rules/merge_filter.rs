//! Filter pushdown.

use common_error::TidalResult;
use tidal_plan::expr::{Expr, FunctionExpr};
use tidal_plan::ops::FilterSpec;
use tidal_plan::{NodeId, Pattern, PlanGraph, ReadMatch};

use super::{RewriteRule, Transformed};
use crate::pushdown::partition_predicate;

/// Push the storage-evaluable part of a filter into the physical read.
///
/// A fully pushed filter disappears into the read. A partly pushed one
/// stays in place, narrowed to the residual predicate, unless the read
/// feeds other nodes too.
pub struct MergeReadFilter;

impl RewriteRule for MergeReadFilter {
    fn name(&self) -> &'static str {
        "MergeReadFilter"
    }

    fn description(&self) -> &'static str {
        "Push filter predicates into the physical read"
    }

    fn pattern(&self) -> Pattern {
        ReadMatch::<FilterSpec>::pattern()
    }

    fn rewrite(&self, graph: &PlanGraph, id: &NodeId) -> TidalResult<Transformed> {
        let Some(m) = ReadMatch::<FilterSpec>::bind(graph, id) else {
            return Ok(Transformed::No);
        };
        // Filtering after grouping or aggregation sees different rows.
        if m.read.is_grouped_or_aggregated() {
            return Ok(Transformed::No);
        }
        let func = &m.spec.func;
        let Some(param) = func.single_param() else {
            return Ok(Transformed::No);
        };

        let (pushable, residual) = partition_predicate(param, &func.body);
        let Some(pushable) = pushable else {
            return Ok(Transformed::No);
        };

        let mut read = m.read.clone();
        let pushed = match read.filter.take() {
            Some(existing) if read.filter_set => extend(existing, param, pushable),
            _ => func.with_body(pushable),
        };
        read.filter = Some(pushed);
        read.filter_set = true;

        Ok(match residual {
            None => Transformed::Merge(read),
            // Narrowing a shared read in place would filter its other consumers.
            Some(_) if m.shared => Transformed::No,
            Some(residual) => Transformed::Replace {
                node: Some(FilterSpec::new(func.with_body(residual)).into()),
                read: Some(read),
            },
        })
    }
}

/// Conjoin `pushable`, written over `param`, onto an already pushed filter.
fn extend(existing: FunctionExpr, param: &str, pushable: Expr) -> FunctionExpr {
    let pushable = match existing.single_param() {
        Some(target) if target != param => rename_param(pushable, param, target),
        _ => pushable,
    };
    FunctionExpr {
        body: existing.body.and(pushable),
        params: existing.params,
    }
}

fn rename_param(expr: Expr, from: &str, to: &str) -> Expr {
    match expr {
        Expr::Identifier(name) if name == from => Expr::Identifier(to.to_string()),
        Expr::Member { object, property } => Expr::member(rename_param(*object, from, to), property),
        Expr::Binary { left, op, right } => Expr::binary(
            rename_param(*left, from, to),
            op,
            rename_param(*right, from, to),
        ),
        Expr::Logical { left, op, right } => Expr::logical(
            rename_param(*left, from, to),
            op,
            rename_param(*right, from, to),
        ),
        Expr::Unary { op, expr } => Expr::Unary {
            op,
            expr: Box::new(rename_param(*expr, from, to)),
        },
        Expr::Call { callee, args } => Expr::call(
            callee,
            args.into_iter().map(|a| rename_param(a, from, to)).collect(),
        ),
        other => other,
    }
}
