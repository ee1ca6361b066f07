//! Metrics collected while a source runs.

use std::time::Duration;

/// Counters for one run of a storage source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceMetrics {
    /// Windows the reader was invoked for.
    pub windows: u64,
    /// Tables delivered to consumers.
    pub tables: u64,
    /// Points across all delivered tables.
    pub rows: u64,
    /// Peak bytes reserved by a single table.
    pub peak_table_bytes: usize,
    /// Wall time of the run.
    pub exec_time: Duration,
}

impl SourceMetrics {
    /// Create empty metrics.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            windows: 0,
            tables: 0,
            rows: 0,
            peak_table_bytes: 0,
            exec_time: Duration::new(0, 0),
        }
    }

    /// Count one reader invocation.
    pub fn add_window(&mut self) {
        self.windows += 1;
    }

    /// Count one delivered table.
    pub fn add_table(&mut self, rows: usize, reserved_bytes: usize) {
        self.tables += 1;
        self.rows += rows as u64;
        self.peak_table_bytes = self.peak_table_bytes.max(reserved_bytes);
    }

    /// Add execution time.
    pub fn add_time(&mut self, duration: Duration) {
        self.exec_time += duration;
    }

    /// Points per second over the run.
    #[allow(clippy::cast_precision_loss)]
    pub fn throughput(&self) -> f64 {
        let secs = self.exec_time.as_secs_f64();
        if secs == 0.0 {
            0.0
        } else {
            self.rows as f64 / secs
        }
    }
}

impl std::fmt::Display for SourceMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "windows={}, tables={}, rows={}, peak={}B, time={:?}",
            self.windows, self.tables, self.rows, self.peak_table_bytes, self.exec_time
        )
    }
}
