//! Storage reader contract.

use std::sync::Arc;

use async_trait::async_trait;

use common_error::TidalResult;
use common_runtime::CancellationToken;
use tidal_core::Time;

use crate::memory::MemoryManager;
use crate::read_spec::ReadSpec;
use crate::stream::TableStream;

/// The I/O boundary of a storage source.
///
/// A source calls [`Reader::read`] once per window with disjoint
/// `[start, stop)` pairs. Implementations should stop early once `cancel`
/// fires and should account the memory of every table they produce against
/// `alloc`, attaching the reservation to the table so it is released as the
/// table is consumed.
#[async_trait]
pub trait Reader: Send + Sync {
    /// Read the tables of one window.
    async fn read(
        &self,
        cancel: &CancellationToken,
        spec: &ReadSpec,
        start: Time,
        stop: Time,
        alloc: Arc<dyn MemoryManager>,
    ) -> TidalResult<TableStream>;

    /// Release reader resources.
    fn close(&self) {}
}
