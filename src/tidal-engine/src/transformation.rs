//! Downstream consumers of a source.

use async_trait::async_trait;

use common_error::{TidalError, TidalResult};
use tidal_core::{DatasetId, Time};
use tidal_storage::Table;

/// A consumer a source pushes tables and progress signals into.
///
/// A source calls the methods of one consumer in this order: `process` and
/// `update_processing_time` per table, `update_watermark` once per window,
/// then `finish` exactly once. An error returned from any of the first three
/// stops the source, which then finishes every consumer with that error.
#[async_trait]
pub trait Transformation: Send + Sync {
    /// Consume one table of `id`.
    ///
    /// The table's memory is released once every consumer has seen it.
    async fn process(&self, id: DatasetId, table: &Table) -> TidalResult<()>;

    /// Processing-time heartbeat, sent after every table.
    async fn update_processing_time(&self, id: DatasetId, now: Time) -> TidalResult<()>;

    /// No data below `mark` will arrive from `id` anymore.
    async fn update_watermark(&self, id: DatasetId, mark: Time) -> TidalResult<()>;

    /// The source is done; `err` is set when it stopped on a failure.
    async fn finish(&self, id: DatasetId, err: Option<&TidalError>);
}
