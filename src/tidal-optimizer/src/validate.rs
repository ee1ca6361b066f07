//! Physical plan validation.

use common_error::TidalResult;
use tidal_plan::PlanGraph;
use tidal_plan::ProcedureSpec;
use tidal_plan::read::unbounded_read;

/// Reject a finalized plan that storage cannot execute.
///
/// Every read must be a time-bounded physical read. A logical read that was
/// never converted has no bounds at all and fails the same way.
pub fn validate_physical(plan: &PlanGraph) -> TidalResult<()> {
    for node in plan.nodes() {
        match node.spec() {
            ProcedureSpec::PhysicalRead(read) => read.post_physical_validate(node.id())?,
            ProcedureSpec::From(from) => return Err(unbounded_read(node.id(), &from.bucket)),
            _ => {}
        }
    }
    Ok(())
}
