//! Fixed-point rule driver.
//!
//! Each iteration visits the nodes in topological order and offers every
//! node to each rule whose pattern it matches. Iteration stops when a full
//! pass changes nothing or the iteration limit is reached.

use common_config::PlannerConfig;
use common_error::TidalResult;
use log::debug;
use tidal_plan::PlanGraph;

use super::default_rules;
use super::rule::{OptimizedPlan, RewriteRule, RuleTrace};

/// Configuration for the optimizer.
#[derive(Debug, Clone)]
pub struct OptimizerConfig {
    /// Maximum number of iterations before stopping.
    pub max_iterations: usize,
    /// Whether to enable detailed tracing.
    pub enable_trace: bool,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self::from(&PlannerConfig::default())
    }
}

impl From<&PlannerConfig> for OptimizerConfig {
    fn from(config: &PlannerConfig) -> Self {
        Self {
            max_iterations: config.max_iterations,
            enable_trace: config.enable_trace,
        }
    }
}

impl OptimizerConfig {
    /// Create a new config with the given max iterations.
    #[must_use]
    pub const fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    /// Enable or disable tracing.
    #[must_use]
    pub const fn with_trace(mut self, enable: bool) -> Self {
        self.enable_trace = enable;
        self
    }
}

/// Applies rewrite rules to a plan graph until a fixpoint.
pub struct Optimizer {
    /// The rules to apply (in order).
    rules: Vec<Box<dyn RewriteRule>>,
    /// Configuration.
    config: OptimizerConfig,
}

impl Optimizer {
    /// Create a new optimizer with the given rules.
    pub fn new(rules: Vec<Box<dyn RewriteRule>>) -> Self {
        Self {
            rules,
            config: OptimizerConfig::default(),
        }
    }

    /// Create a new optimizer with custom config.
    pub fn with_config(rules: Vec<Box<dyn RewriteRule>>, config: OptimizerConfig) -> Self {
        Self { rules, config }
    }

    /// Names of the configured rules, in order.
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Rewrite `plan` until no rule changes it.
    pub fn optimize(&self, plan: PlanGraph) -> TidalResult<OptimizedPlan> {
        let mut graph = plan;
        let mut iterations = 0;
        let mut total_rules_applied = 0;
        let mut trace = Vec::new();

        loop {
            if iterations >= self.config.max_iterations {
                debug!(
                    "Optimizer reached max iterations ({}), stopping",
                    self.config.max_iterations
                );
                break;
            }

            iterations += 1;
            let mut changed_this_iteration = false;

            for id in graph.topological_order()? {
                for rule in &self.rules {
                    // An earlier rule may have merged the node away.
                    if !graph.contains(&id) {
                        break;
                    }
                    if !rule.pattern().matches(&graph, &id) {
                        continue;
                    }

                    let result = rule.rewrite(&graph, &id)?;
                    if !result.changed() {
                        continue;
                    }

                    let before = self.config.enable_trace.then(|| graph.explain());
                    let survivor = result.apply(&mut graph, &id)?;
                    changed_this_iteration = true;
                    total_rules_applied += 1;

                    debug!(
                        "Rule '{}' rewrote {} into {} in iteration {}",
                        rule.name(),
                        id,
                        survivor,
                        iterations
                    );

                    if let Some(before) = before {
                        trace.push(RuleTrace::new(
                            rule.name(),
                            id.clone(),
                            before,
                            graph.explain(),
                        ));
                    }
                }
            }

            if !changed_this_iteration {
                debug!("No changes in iteration {iterations}, reached fixpoint");
                break;
            }
        }

        Ok(OptimizedPlan {
            plan: graph,
            iterations,
            rules_applied: total_rules_applied,
            trace,
        })
    }
}

impl Default for Optimizer {
    fn default() -> Self {
        Self::new(default_rules())
    }
}

impl From<&PlannerConfig> for Optimizer {
    fn from(config: &PlannerConfig) -> Self {
        Self::with_config(default_rules(), OptimizerConfig::from(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::rule::Transformed;
    use common_error::TidalError;
    use tidal_plan::ops::{FromSpec, YieldSpec};
    use tidal_plan::{NodeId, Pattern, ProcedureKind, ProcedureSpec};

    struct NoChangeRule;

    impl RewriteRule for NoChangeRule {
        fn name(&self) -> &'static str {
            "NoChange"
        }

        fn pattern(&self) -> Pattern {
            Pattern::Any
        }

        fn rewrite(&self, _graph: &PlanGraph, _id: &NodeId) -> TidalResult<Transformed> {
            Ok(Transformed::No)
        }
    }

    struct FailingRule;

    impl RewriteRule for FailingRule {
        fn name(&self) -> &'static str {
            "Failing"
        }

        fn pattern(&self) -> Pattern {
            Pattern::kind(ProcedureKind::Yield)
        }

        fn rewrite(&self, _graph: &PlanGraph, id: &NodeId) -> TidalResult<Transformed> {
            Err(TidalError::planning(format!("cannot rewrite {id}")))
        }
    }

    fn plan() -> PlanGraph {
        let mut g = PlanGraph::new();
        g.chain([ProcedureSpec::from(FromSpec::bucket("db")), YieldSpec::default().into()])
            .unwrap();
        g
    }

    #[test]
    fn test_optimizer_fixpoint() {
        let optimizer = Optimizer::new(vec![Box::new(NoChangeRule)]);
        let result = optimizer.optimize(plan()).unwrap();
        assert_eq!(result.iterations, 1);
        assert_eq!(result.rules_applied, 0);
    }

    #[test]
    fn test_optimizer_converts_reads() {
        let result = Optimizer::default().optimize(plan()).unwrap();
        assert_eq!(result.rules_applied, 1);
        assert_eq!(result.iterations, 2);
        assert_eq!(result.plan.physical_reads().count(), 1);
    }

    #[test]
    fn test_optimizer_with_trace() {
        let config = OptimizerConfig::default().with_trace(true);
        let optimizer = Optimizer::with_config(default_rules(), config);
        let result = optimizer.optimize(plan()).unwrap();

        assert_eq!(result.trace.len(), 1);
        assert_eq!(result.trace[0].rule_name, "FromConversion");
        assert!(result.trace[0].before.contains("[from]"));
        assert!(result.trace[0].after.contains("[physicalRead]"));
        assert!(result.format_trace().contains("1 rules applied"));
    }

    #[test]
    fn test_rule_errors_abort() {
        let optimizer = Optimizer::new(vec![Box::new(FailingRule)]);
        let err = optimizer.optimize(plan()).unwrap_err();
        assert!(matches!(err, TidalError::PlanningError(_)));
    }

    #[test]
    fn test_iteration_limit() {
        let config = OptimizerConfig::default().with_max_iterations(0);
        let result = Optimizer::with_config(default_rules(), config)
            .optimize(plan())
            .unwrap();
        assert_eq!(result.iterations, 0);
        assert_eq!(result.plan.physical_reads().count(), 0);
    }

    #[test]
    fn test_config_from_planner_config() {
        let planner = PlannerConfig {
            max_iterations: 7,
            enable_trace: true,
        };
        let config = OptimizerConfig::from(&planner);
        assert_eq!(config.max_iterations, 7);
        assert!(config.enable_trace);
        assert_eq!(Optimizer::from(&planner).rule_names().len(), 6);
    }
}
