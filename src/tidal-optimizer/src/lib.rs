//! Storage read planner for Tidal plans.
//!
//! Folds range, filter, group, distinct and keys operations into the
//! physical read below them so storage does the work.

pub mod pushdown;
mod rules;
mod validate;

pub use pushdown::partition_predicate;
pub use rules::{
    FromConversion, MergeReadFilter, MergeReadGroup, MergeReadRange, OptimizedPlan, Optimizer,
    OptimizerConfig, ReadDistinctProbe, ReadKeysProbe, RewriteRule, RuleTrace, Transformed,
    default_rules,
};
pub use validate::validate_physical;

use common_error::TidalResult;
use tidal_plan::PlanGraph;

/// Optimize a plan with the default rules and validate the result.
pub fn optimize_physical(plan: PlanGraph) -> TidalResult<PlanGraph> {
    optimize_physical_with(&Optimizer::default(), plan)
}

/// Optimize a plan with `optimizer` and validate the result.
pub fn optimize_physical_with(optimizer: &Optimizer, plan: PlanGraph) -> TidalResult<PlanGraph> {
    let optimized = optimizer.optimize(plan)?;
    validate_physical(&optimized.plan)?;
    Ok(optimized.plan)
}
