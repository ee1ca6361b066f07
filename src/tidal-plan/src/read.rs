//! Physical read specification.
//!
//! A [`PhysicalReadSpec`] accumulates everything pushed down into a storage
//! read. It starts unbounded at logical-to-physical conversion and is
//! enriched field by field by the rewrite rules. Rules clone the spec they
//! matched, mutate the clone and hand it back to the graph; a spec held by
//! the graph is never mutated in place.

use serde::{Deserialize, Serialize};

use common_error::{TidalError, TidalResult};
use tidal_core::{Bounds, GroupMode, ResolvedBounds, Window};

use crate::expr::FunctionExpr;
use crate::graph::NodeId;
use crate::ops::{BucketRef, FromSpec};

/// Points limit marking a read capped to the first point of every series.
pub const FIRST_POINT_ONLY: i64 = -1;

/// Storage read with pushed-down bounds, predicate, limits and grouping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhysicalReadSpec {
    /// Bucket to read.
    pub bucket: BucketRef,

    /// Time bounds, meaningful when `bounds_set`.
    pub bounds: Bounds,
    pub bounds_set: bool,

    /// Pushed-down row predicate.
    pub filter: Option<FunctionExpr>,
    pub filter_set: bool,

    pub descending_set: bool,
    pub descending: bool,

    /// Per-series point cap; [`FIRST_POINT_ONLY`] for existence probes.
    pub limit_set: bool,
    pub points_limit: i64,
    pub series_limit: i64,
    pub series_offset: i64,

    /// Explicit window schedule. No rule sets it today.
    pub window_set: bool,
    pub window: Window,

    pub grouping_set: bool,
    pub order_by_time: bool,
    pub group_mode: GroupMode,
    pub group_keys: Vec<String>,

    pub aggregate_set: bool,
    pub aggregate_method: String,
}

impl PhysicalReadSpec {
    /// Unbounded read of `bucket` with every optional flag unset.
    pub fn new(bucket: BucketRef) -> Self {
        Self {
            bucket,
            bounds: Bounds::default(),
            bounds_set: false,
            filter: None,
            filter_set: false,
            descending_set: false,
            descending: false,
            limit_set: false,
            points_limit: 0,
            series_limit: 0,
            series_offset: 0,
            window_set: false,
            window: Window::default(),
            grouping_set: false,
            order_by_time: false,
            group_mode: GroupMode::None,
            group_keys: Vec::new(),
            aggregate_set: false,
            aggregate_method: String::new(),
        }
    }

    /// Physical read converted from a logical one.
    pub fn from_logical(spec: &FromSpec) -> Self {
        Self::new(spec.bucket.clone())
    }

    /// Absolute bounds, with relative edges resolved against `now`.
    pub const fn time_bounds(&self) -> ResolvedBounds {
        self.bounds.resolve()
    }

    /// Whether the read is capped to the first point of every series.
    pub const fn is_single_point_probe(&self) -> bool {
        self.points_limit == FIRST_POINT_ONLY
    }

    /// Cap the read to the first point of every series.
    pub const fn cap_to_single_point(&mut self) {
        self.limit_set = true;
        self.points_limit = FIRST_POINT_ONLY;
    }

    /// Whether grouping or aggregation was pushed down.
    pub const fn is_grouped_or_aggregated(&self) -> bool {
        self.grouping_set || self.aggregate_set
    }

    /// Reject a read that is not executable.
    ///
    /// Every read must be time-bounded; unset bounds and a zero start and
    /// stop pair both fail.
    pub fn post_physical_validate(&self, id: &NodeId) -> TidalResult<()> {
        if !self.bounds_set || self.bounds.is_zero() {
            return Err(unbounded_read(id, &self.bucket));
        }
        Ok(())
    }

    /// One-line summary for explain output.
    pub fn summary(&self) -> String {
        let mut parts = vec![format!("bucket={}", self.bucket)];
        if self.bounds_set {
            let b = self.time_bounds();
            parts.push(format!("bounds=[{}, {})", b.start, b.stop));
        }
        if let Some(filter) = &self.filter {
            parts.push(format!("filter={filter}"));
        }
        if self.descending_set {
            parts.push(format!("descending={}", self.descending));
        }
        if self.limit_set {
            parts.push(format!("pointsLimit={}", self.points_limit));
            if self.series_limit != 0 || self.series_offset != 0 {
                parts.push(format!(
                    "seriesLimit={}, seriesOffset={}",
                    self.series_limit, self.series_offset
                ));
            }
        }
        if self.window_set {
            parts.push(format!(
                "window=every {} period {}",
                self.window.every, self.window.period
            ));
        }
        if self.grouping_set {
            parts.push(format!(
                "group={}[{}]",
                self.group_mode,
                self.group_keys.join(", ")
            ));
        }
        if self.aggregate_set {
            parts.push(format!("aggregate={}", self.aggregate_method));
        }
        parts.join(", ")
    }
}

/// Error for a read that reached validation without time bounds.
pub fn unbounded_read(id: &NodeId, bucket: &BucketRef) -> TidalError {
    TidalError::validation(format!("{id}: results from \"{bucket}\" must be bounded"))
}
