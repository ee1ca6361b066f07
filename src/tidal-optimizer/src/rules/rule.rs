//! Rewrite rule trait and framework.
//!
//! A rule inspects a matched node and returns a [`Transformed`] describing
//! the new spec values. It never touches the graph itself; the driver
//! applies the result through the graph's replace and merge operations.

use common_error::{TidalError, TidalResult};
use tidal_plan::{NodeId, Pattern, PhysicalReadSpec, PlanGraph, ProcedureSpec};

/// A single rewrite rule over the plan graph.
pub trait RewriteRule: Send + Sync {
    /// Get the name of this rule.
    fn name(&self) -> &'static str;

    /// Get a description of what this rule does.
    fn description(&self) -> &'static str {
        "No description available"
    }

    /// Node-kind pattern the rule is anchored on.
    fn pattern(&self) -> Pattern;

    /// Compute the rewrite of the node `id`, which matched [`Self::pattern`].
    ///
    /// Returning [`Transformed::No`] means the rule does not apply. An error
    /// aborts planning.
    fn rewrite(&self, graph: &PlanGraph, id: &NodeId) -> TidalResult<Transformed>;
}

/// The result of applying a rewrite rule.
#[derive(Debug, Clone, PartialEq)]
pub enum Transformed {
    /// The rule does not apply.
    No,
    /// Replace specs in place, keeping every node and edge.
    Replace {
        /// New spec for the matched node.
        node: Option<ProcedureSpec>,
        /// New spec for the physical read the matched node reads from.
        read: Option<PhysicalReadSpec>,
    },
    /// Fold the matched node into its physical read.
    Merge(PhysicalReadSpec),
}

impl Transformed {
    /// Replace the matched node's spec.
    pub fn node(spec: impl Into<ProcedureSpec>) -> Self {
        Self::Replace {
            node: Some(spec.into()),
            read: None,
        }
    }

    /// Replace the spec of the physical read below the matched node.
    pub const fn read(spec: PhysicalReadSpec) -> Self {
        Self::Replace {
            node: None,
            read: Some(spec),
        }
    }

    /// Whether the plan was actually changed.
    pub const fn changed(&self) -> bool {
        !matches!(self, Self::No)
    }

    /// Apply the rewrite to `graph`. Returns the id of the surviving node.
    pub fn apply(self, graph: &mut PlanGraph, id: &NodeId) -> TidalResult<NodeId> {
        match self {
            Self::No => Ok(id.clone()),
            Self::Replace { node, read } => {
                if let Some(read) = read {
                    let read_id = single_predecessor(graph, id)?;
                    graph.replace_spec(&read_id, read)?;
                }
                if let Some(node) = node {
                    graph.replace_spec(id, node)?;
                }
                Ok(id.clone())
            }
            Self::Merge(read) => graph.merge_to_physical_node(id, read),
        }
    }
}

fn single_predecessor(graph: &PlanGraph, id: &NodeId) -> TidalResult<NodeId> {
    match graph.node(id)?.predecessors() {
        [p] => Ok(p.clone()),
        preds => Err(TidalError::planning(format!(
            "{id}: expected one input, found {}",
            preds.len()
        ))),
    }
}

/// A trace entry for a single rule application.
#[derive(Debug, Clone)]
pub struct RuleTrace {
    /// The name of the rule that was applied.
    pub rule_name: String,
    /// The node the rule matched.
    pub node: NodeId,
    /// The plan before the rule was applied (as explain string).
    pub before: String,
    /// The plan after the rule was applied (as explain string).
    pub after: String,
}

impl RuleTrace {
    /// Create a new trace entry.
    pub fn new(
        rule_name: impl Into<String>,
        node: NodeId,
        before: impl Into<String>,
        after: impl Into<String>,
    ) -> Self {
        Self {
            rule_name: rule_name.into(),
            node,
            before: before.into(),
            after: after.into(),
        }
    }
}

/// The result of optimization with optional trace information.
#[derive(Debug, Clone)]
pub struct OptimizedPlan {
    /// The final plan graph.
    pub plan: PlanGraph,
    /// Number of optimization iterations performed.
    pub iterations: usize,
    /// Number of rule applications that changed the plan.
    pub rules_applied: usize,
    /// Detailed trace of rule applications (if tracing was enabled).
    pub trace: Vec<RuleTrace>,
}

impl OptimizedPlan {
    /// Create a new optimized plan result.
    pub fn new(plan: PlanGraph) -> Self {
        Self {
            plan,
            iterations: 0,
            rules_applied: 0,
            trace: Vec::new(),
        }
    }

    /// Format the trace as a human-readable string.
    pub fn format_trace(&self) -> String {
        use std::fmt::Write as _;

        let mut output = format!(
            "Optimization completed in {} iterations, {} rules applied\n",
            self.iterations, self.rules_applied
        );

        if self.trace.is_empty() {
            output.push_str("  (no trace available)\n");
        } else {
            for (i, entry) in self.trace.iter().enumerate() {
                let _ = writeln!(
                    output,
                    "\n--- Rule {} applied: {} on {} ---",
                    i + 1,
                    entry.rule_name,
                    entry.node
                );
                output.push_str("Before:\n");
                output.push_str(&entry.before);
                output.push_str("After:\n");
                output.push_str(&entry.after);
            }
        }

        output
    }
}
