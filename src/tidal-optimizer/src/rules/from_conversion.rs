//! Logical-to-physical read conversion.

use common_error::{TidalError, TidalResult};
use tidal_plan::{NodeId, Pattern, PhysicalReadSpec, PlanGraph, ProcedureKind};

use super::{RewriteRule, Transformed};

/// Turn every logical read into an unbounded physical read.
///
/// The physical read copies the bucket reference and leaves every optional
/// flag unset. A later range merge has to bound it before validation.
pub struct FromConversion;

impl RewriteRule for FromConversion {
    fn name(&self) -> &'static str {
        "FromConversion"
    }

    fn description(&self) -> &'static str {
        "Convert a logical read into an unbounded physical read"
    }

    fn pattern(&self) -> Pattern {
        Pattern::kind(ProcedureKind::From)
    }

    fn rewrite(&self, graph: &PlanGraph, id: &NodeId) -> TidalResult<Transformed> {
        let spec = graph
            .node(id)?
            .spec()
            .as_from()
            .ok_or_else(|| TidalError::internal(format!("{id} is not a logical read")))?;
        Ok(Transformed::node(PhysicalReadSpec::from_logical(spec)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tidal_plan::ops::FromSpec;

    #[test]
    fn test_conversion_is_unbounded_copy() {
        let mut g = PlanGraph::new();
        let id = g.add_node(FromSpec::bucket_id("0001"));
        let rule = FromConversion;
        assert!(rule.pattern().matches(&g, &id));

        let Transformed::Replace { node: Some(spec), read: None } = rule.rewrite(&g, &id).unwrap()
        else {
            panic!("expected a node replacement");
        };
        let read = spec.as_physical_read().unwrap();
        assert!(!read.bounds_set);
        assert!(!read.filter_set && !read.limit_set && !read.grouping_set);
        assert_eq!(read.bucket, FromSpec::bucket_id("0001").bucket);
    }
}
