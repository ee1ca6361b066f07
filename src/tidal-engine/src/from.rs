//! Construction of a storage source from a finalized physical read.

use log::debug;

use common_error::{TidalError, TidalResult};
use tidal_core::{DatasetId, ResolvedBounds, Window};
use tidal_plan::{BucketRef, PhysicalReadSpec};
use tidal_storage::{Privilege, ReadSpec};

use crate::context::ExecutionContext;
use crate::deps::FromDependencies;
use crate::source::StorageSource;

/// Split `db/rp` on the first `/`; a bare name leaves the policy empty.
pub fn split_bucket(bucket: &str) -> (&str, &str) {
    bucket.split_once('/').unwrap_or((bucket, ""))
}

/// Build the runnable source for `spec`.
///
/// The stream bounds come from the context, falling back to the bounds
/// pushed into the read. Without an explicit window the whole interval is
/// read in one window.
pub fn create_from_source(
    spec: &PhysicalReadSpec,
    id: DatasetId,
    ctx: &ExecutionContext,
    deps: &FromDependencies,
) -> TidalResult<StorageSource> {
    deps.validate()?;

    let bounds = stream_bounds(spec, ctx)?;
    let window = if spec.window_set {
        spec.window.validate()?;
        spec.window
    } else {
        Window::whole(&bounds)
    };
    let current_time = bounds.start.saturating_add(window.period);

    let bucket = match &spec.bucket {
        BucketRef::Name(name) => name,
        BucketRef::Id(_) => {
            return Err(TidalError::unsupported(
                "cannot refer to buckets by their id in this storage backend",
            ));
        }
    };
    let (db, rp) = split_bucket(bucket);

    let Some(info) = deps.meta_client.database(db) else {
        return Err(TidalError::not_found(format!("no database \"{db}\"")));
    };

    if deps.auth_enabled {
        let Some(user) = ctx.user() else {
            return Err(TidalError::unauthorized("no user in execution context"));
        };
        let authorizer = deps
            .authorizer
            .as_ref()
            .ok_or_else(|| TidalError::internal("authorization enabled without an authorizer"))?;
        authorizer.authorize_database(user, Privilege::Read, db)?;
    }

    let rp = if rp.is_empty() {
        info.default_retention_policy.as_str()
    } else {
        rp
    };
    if info.retention_policy(rp).is_none() {
        return Err(TidalError::not_found(format!(
            "invalid retention policy \"{rp}\" for database \"{db}\""
        )));
    }

    debug!("{id}: reading {db}/{rp} over [{}, {})", bounds.start, bounds.stop);

    let read_spec = ReadSpec {
        database: db.to_string(),
        retention_policy: rp.to_string(),
        predicate: spec.filter.clone(),
        points_limit: spec.points_limit,
        series_limit: spec.series_limit,
        series_offset: spec.series_offset,
        descending: spec.descending,
        order_by_time: spec.order_by_time,
        group_mode: spec.group_mode.into(),
        group_keys: spec.group_keys.clone(),
        aggregate_method: spec.aggregate_method.clone(),
        ..ReadSpec::default()
    };

    Ok(StorageSource::new(
        id,
        deps.reader.clone(),
        read_spec,
        bounds,
        window,
        current_time,
        ctx.memory().clone(),
    )
    .with_cancellation(ctx.cancellation().clone())
    .with_read_error_policy(ctx.config().read_error_policy))
}

fn stream_bounds(spec: &PhysicalReadSpec, ctx: &ExecutionContext) -> TidalResult<ResolvedBounds> {
    match ctx.bounds() {
        Some(bounds) => Ok(bounds),
        None if spec.bounds_set => Ok(spec.time_bounds()),
        None => Err(TidalError::validation(format!(
            "no bounds for the read of \"{}\"",
            spec.bucket
        ))),
    }
}
