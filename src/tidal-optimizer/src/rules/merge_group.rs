//! Group pushdown.

use common_error::TidalResult;
use tidal_core::GroupMode;
use tidal_core::labels::is_time_or_value;
use tidal_plan::ops::GroupSpec;
use tidal_plan::{NodeId, Pattern, PlanGraph, ReadMatch};

use super::{RewriteRule, Transformed};

/// Merge `group(columns: ...)` into the physical read.
///
/// Storage groups on tag keys only. `_start` and `_stop` are always part of
/// the storage group key, so they are accepted.
pub struct MergeReadGroup;

impl RewriteRule for MergeReadGroup {
    fn name(&self) -> &'static str {
        "MergeReadGroup"
    }

    fn description(&self) -> &'static str {
        "Push group-by-keys into the physical read"
    }

    fn pattern(&self) -> Pattern {
        ReadMatch::<GroupSpec>::pattern()
    }

    fn rewrite(&self, graph: &PlanGraph, id: &NodeId) -> TidalResult<Transformed> {
        let Some(m) = ReadMatch::<GroupSpec>::bind(graph, id) else {
            return Ok(Transformed::No);
        };
        if m.read.grouping_set || m.read.limit_set || m.spec.mode != GroupMode::By {
            return Ok(Transformed::No);
        }
        if m.spec.keys.iter().any(|k| is_time_or_value(k)) {
            return Ok(Transformed::No);
        }

        let mut read = m.read.clone();
        read.grouping_set = true;
        read.group_mode = m.spec.mode;
        read.group_keys.clone_from(&m.spec.keys);
        Ok(Transformed::Merge(read))
    }
}
