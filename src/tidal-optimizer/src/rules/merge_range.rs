//! Range pushdown.

use common_error::TidalResult;
use tidal_core::Bounds;
use tidal_plan::ops::RangeSpec;
use tidal_plan::{NodeId, Pattern, PlanGraph, ReadMatch};

use super::{RewriteRule, Transformed};

/// Merge `range` into the physical read below it.
///
/// An unbounded read takes the range bounds as given. A bounded read keeps
/// the intersection of both intervals, stored as absolute instants. An
/// empty intersection is kept; it reads nothing.
pub struct MergeReadRange;

impl RewriteRule for MergeReadRange {
    fn name(&self) -> &'static str {
        "MergeReadRange"
    }

    fn description(&self) -> &'static str {
        "Push a time range into the physical read"
    }

    fn pattern(&self) -> Pattern {
        ReadMatch::<RangeSpec>::pattern()
    }

    fn rewrite(&self, graph: &PlanGraph, id: &NodeId) -> TidalResult<Transformed> {
        let Some(m) = ReadMatch::<RangeSpec>::bind(graph, id) else {
            return Ok(Transformed::No);
        };

        let mut read = m.read.clone();
        read.bounds = if read.bounds_set {
            Bounds::from(read.time_bounds().intersect(&m.spec.resolved()))
        } else {
            m.spec.bounds
        };
        read.bounds_set = true;

        Ok(Transformed::Merge(read))
    }
}
