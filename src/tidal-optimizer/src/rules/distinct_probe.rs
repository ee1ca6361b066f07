//! Distinct over a grouping key.

use common_error::TidalResult;
use tidal_core::GroupMode;
use tidal_core::labels::{DEFAULT_TIME_COL, DEFAULT_VALUE_COL};
use tidal_plan::ops::DistinctSpec;
use tidal_plan::{NodeId, Pattern, PhysicalReadSpec, PlanGraph, ReadMatch};

use super::{RewriteRule, Transformed};

/// Cap the read to one point per series when `distinct` runs over a key.
///
/// A key column is constant within a series, so the first point of each
/// series carries every distinct value. The distinct node stays.
pub struct ReadDistinctProbe;

impl RewriteRule for ReadDistinctProbe {
    fn name(&self) -> &'static str {
        "ReadDistinctProbe"
    }

    fn description(&self) -> &'static str {
        "Read one point per series under a distinct over a key column"
    }

    fn pattern(&self) -> Pattern {
        ReadMatch::<DistinctSpec>::pattern()
    }

    fn rewrite(&self, graph: &PlanGraph, id: &NodeId) -> TidalResult<Transformed> {
        let Some(m) = ReadMatch::<DistinctSpec>::bind(graph, id) else {
            return Ok(Transformed::No);
        };
        if m.shared || m.read.is_single_point_probe() || !is_key_column(m.read, &m.spec.column) {
            return Ok(Transformed::No);
        }

        let mut read = m.read.clone();
        read.cap_to_single_point();
        Ok(Transformed::read(read))
    }
}

/// Whether `column` is constant within every series the read returns.
fn is_key_column(read: &PhysicalReadSpec, column: &str) -> bool {
    if !read.grouping_set {
        return column != DEFAULT_VALUE_COL && column != DEFAULT_TIME_COL;
    }
    if read.group_keys.is_empty() {
        return false;
    }
    let listed = read.group_keys.iter().any(|k| k == column);
    match read.group_mode {
        GroupMode::By => listed,
        GroupMode::Except => !listed,
        GroupMode::None | GroupMode::All => false,
    }
}
