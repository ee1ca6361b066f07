//! Windowed streaming source over a storage reader.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use futures::StreamExt;
use log::{debug, error, trace};

use common_config::ReadErrorPolicy;
use common_error::{TidalError, TidalResult};
use common_runtime::CancellationToken;
use tidal_core::{DatasetId, ResolvedBounds, Time, Window};
use tidal_storage::{MemoryManager, ReadSpec, Reader};

use crate::metrics::SourceMetrics;
use crate::transformation::Transformation;

/// A runnable producer of tables.
#[async_trait]
pub trait Source: Send {
    /// Dataset this source produces.
    fn id(&self) -> DatasetId;

    /// Register a downstream consumer; consumers are fed in registration order.
    fn add_transformation(&mut self, t: Arc<dyn Transformation>);

    /// Drive the source to completion and finish every consumer once.
    async fn run(&mut self);
}

/// Source that reads one bounded interval window by window.
///
/// Windows are read strictly one after another. The next window starts at
/// `current_time - period` and stops at `current_time`; the source is
/// exhausted once a window leaves the bounds or once advancing
/// `current_time` would leave the time domain.
pub struct StorageSource {
    id: DatasetId,
    reader: Arc<dyn Reader>,
    read_spec: ReadSpec,
    bounds: ResolvedBounds,
    window: Window,
    alloc: Arc<dyn MemoryManager>,
    cancel: CancellationToken,
    read_error_policy: ReadErrorPolicy,

    transformations: Vec<Arc<dyn Transformation>>,

    current_time: Time,
    overflow: bool,
    metrics: SourceMetrics,
}

impl std::fmt::Debug for StorageSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageSource")
            .field("id", &self.id)
            .field("read_spec", &self.read_spec)
            .field("bounds", &self.bounds)
            .field("window", &self.window)
            .field("current_time", &self.current_time)
            .field("overflow", &self.overflow)
            .field("transformations", &self.transformations.len())
            .finish_non_exhaustive()
    }
}

impl StorageSource {
    /// Create a source positioned at `current_time`.
    pub fn new(
        id: DatasetId,
        reader: Arc<dyn Reader>,
        read_spec: ReadSpec,
        bounds: ResolvedBounds,
        window: Window,
        current_time: Time,
        alloc: Arc<dyn MemoryManager>,
    ) -> Self {
        Self {
            id,
            reader,
            read_spec,
            bounds,
            window,
            alloc,
            cancel: CancellationToken::never(),
            read_error_policy: ReadErrorPolicy::default(),
            transformations: Vec::new(),
            current_time,
            // An empty interval has no window to read.
            overflow: bounds.is_empty(),
            metrics: SourceMetrics::new(),
        }
    }

    /// Thread a cancellation token through to every reader call.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Set what happens when a reader call fails.
    #[must_use]
    pub const fn with_read_error_policy(mut self, policy: ReadErrorPolicy) -> Self {
        self.read_error_policy = policy;
        self
    }

    pub fn read_spec(&self) -> &ReadSpec {
        &self.read_spec
    }

    pub const fn bounds(&self) -> ResolvedBounds {
        self.bounds
    }

    pub const fn window(&self) -> Window {
        self.window
    }

    pub const fn current_time(&self) -> Time {
        self.current_time
    }

    /// Whether no further window will be produced.
    pub fn is_exhausted(&self) -> bool {
        self.overflow || self.past_bounds(self.current_time)
    }

    /// Metrics of the run so far.
    pub fn metrics(&self) -> &SourceMetrics {
        &self.metrics
    }

    fn past_bounds(&self, stop: Time) -> bool {
        if stop > self.bounds.stop {
            return true;
        }
        // Windows walking backwards leave through the start.
        !self.window.every.is_positive() && stop.saturating_sub(self.window.period) < self.bounds.start
    }

    /// Advance the schedule and return the next window to read.
    ///
    /// Returns `None` once exhausted, and keeps returning `None` afterwards.
    pub fn next_window(&mut self) -> Option<ResolvedBounds> {
        if self.overflow {
            return None;
        }

        let stop = self.current_time;
        let start = stop.saturating_sub(self.window.period);
        if self.past_bounds(stop) {
            return None;
        }

        // The current window is still read; only the following one is lost.
        let (next, overflowed) = self.current_time.overflowing_add(self.window.every);
        self.overflow = overflowed;
        self.current_time = next;

        Some(ResolvedBounds::new(start, stop))
    }

    fn read_failed(&self, err: TidalError) -> TidalResult<()> {
        error!(
            "{}: read of {}/{} failed: {err}",
            self.id, self.read_spec.database, self.read_spec.retention_policy
        );
        if self.read_error_policy.propagates() {
            Err(err)
        } else {
            Ok(())
        }
    }

    async fn run_windows(&mut self) -> TidalResult<()> {
        while let Some(window) = self.next_window() {
            trace!("{}: window [{}, {})", self.id, window.start, window.stop);

            let read = self
                .reader
                .read(
                    &self.cancel,
                    &self.read_spec,
                    window.start,
                    window.stop,
                    Arc::clone(&self.alloc),
                )
                .await;
            let mut tables = match read {
                Ok(tables) => tables,
                // A failed read ends the stream.
                Err(err) => return self.read_failed(err),
            };
            self.metrics.add_window();

            while let Some(table) = tables.next().await {
                let table = table?;
                self.metrics.add_table(table.num_rows(), table.reserved_bytes());
                for t in &self.transformations {
                    t.process(self.id, &table).await?;
                    t.update_processing_time(self.id, Time::now()).await?;
                }
            }

            for t in &self.transformations {
                t.update_watermark(self.id, window.stop).await?;
            }
        }
        Ok(())
    }

    /// Run on a fresh runtime, blocking the calling thread.
    pub fn run_blocking(&mut self) -> TidalResult<()> {
        common_runtime::block_on(self.run())
    }
}

#[async_trait]
impl Source for StorageSource {
    fn id(&self) -> DatasetId {
        self.id
    }

    fn add_transformation(&mut self, t: Arc<dyn Transformation>) {
        self.transformations.push(t);
    }

    async fn run(&mut self) {
        let started = Instant::now();
        let result = self.run_windows().await;
        self.metrics.add_time(started.elapsed());
        debug!("{}: source done: {}", self.id, self.metrics);

        let err = result.err();
        for t in &self.transformations {
            t.finish(self.id, err.as_ref()).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tidal_core::Duration;
    use tidal_storage::{MemoryReader, UnboundedMemory};

    fn source(bounds: (i64, i64), window: Window, current: i64) -> StorageSource {
        StorageSource::new(
            DatasetId(1),
            Arc::new(MemoryReader::new()),
            ReadSpec::new("db", "rp"),
            ResolvedBounds::new(Time::from_nanos(bounds.0), Time::from_nanos(bounds.1)),
            window,
            Time::from_nanos(current),
            Arc::new(UnboundedMemory),
        )
    }

    fn windows(mut s: StorageSource) -> Vec<(i64, i64)> {
        std::iter::from_fn(|| s.next_window())
            .map(|w| (w.start.nanos(), w.stop.nanos()))
            .take(1_000)
            .collect()
    }

    fn every(every: i64, period: i64) -> Window {
        Window::new(Duration::from_nanos(every), Duration::from_nanos(period), Duration::ZERO)
    }

    #[test]
    fn test_whole_interval_is_one_window() {
        let bounds = ResolvedBounds::new(Time::from_nanos(0), Time::from_nanos(100));
        let s = source((0, 100), Window::whole(&bounds), 100);
        assert_eq!(windows(s), vec![(0, 100)]);
    }

    #[test]
    fn test_tumbling_windows() {
        let s = source((0, 30), every(10, 10), 10);
        assert_eq!(windows(s), vec![(0, 10), (10, 20), (20, 30)]);
    }

    #[test]
    fn test_overflow_keeps_current_window() {
        let start = i64::MAX - 25;
        let s = source((start, i64::MAX), every(10, 10), start + 10);
        // Advancing past the second window would wrap; that window is still read.
        assert_eq!(windows(s), vec![(start, start + 10), (start + 10, start + 20)]);
    }

    #[test]
    fn test_overflow_is_sticky() {
        let mut s = source((i64::MAX - 20, i64::MAX), every(10, 10), i64::MAX - 5);
        let expected = ResolvedBounds::new(Time::from_nanos(i64::MAX - 15), Time::from_nanos(i64::MAX - 5));
        assert_eq!(s.next_window(), Some(expected));
        assert!(s.is_exhausted());
        assert_eq!(s.next_window(), None);
        assert_eq!(s.next_window(), None);
    }

    #[test]
    fn test_empty_bounds_produce_no_window() {
        let s = source((50, 20), every(-30, -30), 20);
        assert!(windows(s).is_empty());
        let s = source((10, 10), every(0, 0), 10);
        assert!(windows(s).is_empty());
    }

    #[test]
    fn test_backward_windows_stop_at_bounds_start() {
        let s = source((0, 30), every(-10, 10), 30);
        assert_eq!(windows(s), vec![(20, 30), (10, 20), (0, 10)]);
    }

    proptest! {
        #[test]
        fn prop_windows_are_disjoint_and_cover_bounds(start in -1_000i64..1_000, n in 1i64..20, step in 1i64..50) {
            let stop = start + n * step;
            let s = source((start, stop), every(step, step), start + step);
            let ws = windows(s);
            prop_assert_eq!(ws.len() as i64, n);
            prop_assert_eq!(ws[0].0, start);
            prop_assert_eq!(ws[ws.len() - 1].1, stop);
            for pair in ws.windows(2) {
                prop_assert_eq!(pair[0].1, pair[1].0);
            }
        }

        #[test]
        fn prop_schedule_never_wraps(offset in 0i64..100, step in 1i64..1_000) {
            let start = i64::MAX - offset - step;
            let s = source((start, i64::MAX), every(step, step), start + step);
            for (a, b) in windows(s) {
                prop_assert!(a < b);
                prop_assert!(b <= i64::MAX);
            }
        }
    }
}
