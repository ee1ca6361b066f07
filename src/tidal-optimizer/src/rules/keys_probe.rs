//! Key listing.

use common_error::TidalResult;
use tidal_plan::ops::KeysSpec;
use tidal_plan::{NodeId, Pattern, PlanGraph, ReadMatch};

use super::{RewriteRule, Transformed};

/// Cap the read to one point per series under `keys`.
pub struct ReadKeysProbe;

impl RewriteRule for ReadKeysProbe {
    fn name(&self) -> &'static str {
        "ReadKeysProbe"
    }

    fn description(&self) -> &'static str {
        "Read one point per series when only group keys are listed"
    }

    fn pattern(&self) -> Pattern {
        ReadMatch::<KeysSpec>::pattern()
    }

    fn rewrite(&self, graph: &PlanGraph, id: &NodeId) -> TidalResult<Transformed> {
        let Some(m) = ReadMatch::<KeysSpec>::bind(graph, id) else {
            return Ok(Transformed::No);
        };
        if m.shared || m.read.is_single_point_probe() {
            return Ok(Transformed::No);
        }

        let mut read = m.read.clone();
        read.cap_to_single_point();
        Ok(Transformed::read(read))
    }
}
