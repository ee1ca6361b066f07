//! Memory budget for in-flight tables.
//!
//! A reader takes one [`TableReservation`] per table it hands out, sized by
//! the table's estimated footprint. The reservation travels with the table
//! and returns its bytes when the consumer drops it, so a window's result
//! set never has to be held at once.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use common_error::{TidalError, TidalResult};

/// Budget that admits tables a reader has produced and a consumer still holds.
pub trait MemoryManager: Send + Sync + std::fmt::Debug {
    /// Admit one table of `bytes`. Fails with a resource-exhausted error when
    /// the table does not fit.
    fn admit_table(&self, bytes: usize) -> TidalResult<()>;

    /// Return the bytes of a table admitted earlier.
    fn release_table(&self, bytes: usize);

    /// Bytes held by live tables.
    fn in_use(&self) -> usize;

    /// Number of live tables.
    fn live_tables(&self) -> usize;

    /// Budget in bytes, `None` when unbounded.
    fn limit(&self) -> Option<usize>;
}

/// Admits every table and keeps no count.
#[derive(Debug, Default)]
pub struct UnboundedMemory;

impl MemoryManager for UnboundedMemory {
    fn admit_table(&self, _bytes: usize) -> TidalResult<()> {
        Ok(())
    }

    fn release_table(&self, _bytes: usize) {}

    fn in_use(&self) -> usize {
        0
    }

    fn live_tables(&self) -> usize {
        0
    }

    fn limit(&self) -> Option<usize> {
        None
    }
}

/// Counts live tables and their bytes, refusing tables past the limit.
#[derive(Debug, Default)]
pub struct MemoryBudget {
    limit: Option<usize>,
    in_use: AtomicUsize,
    peak: AtomicUsize,
    tables: AtomicUsize,
}

impl MemoryBudget {
    /// A budget of `limit` bytes.
    pub const fn new(limit: usize) -> Self {
        Self::with_limit(Some(limit))
    }

    /// Accounting without a limit.
    pub const fn unbounded() -> Self {
        Self::with_limit(None)
    }

    const fn with_limit(limit: Option<usize>) -> Self {
        Self {
            limit,
            in_use: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            tables: AtomicUsize::new(0),
        }
    }

    /// Highest number of bytes held at once.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

impl MemoryManager for MemoryBudget {
    fn admit_table(&self, bytes: usize) -> TidalResult<()> {
        let admitted = self
            .in_use
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |held| {
                let next = held.checked_add(bytes)?;
                match self.limit {
                    Some(limit) if next > limit => None,
                    _ => Some(next),
                }
            });
        match admitted {
            Ok(held) => {
                self.peak.fetch_max(held + bytes, Ordering::SeqCst);
                self.tables.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
            Err(held) => Err(TidalError::resource_exhausted(format!(
                "table of {bytes} bytes does not fit: {held} of {} bytes held by {} tables",
                self.limit.unwrap_or(usize::MAX),
                self.live_tables()
            ))),
        }
    }

    fn release_table(&self, bytes: usize) {
        // Both updates saturate, so the closures never refuse.
        let _ = self
            .in_use
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |held| {
                Some(held.saturating_sub(bytes))
            });
        let _ = self
            .tables
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| Some(n.saturating_sub(1)));
    }

    fn in_use(&self) -> usize {
        self.in_use.load(Ordering::SeqCst)
    }

    fn live_tables(&self) -> usize {
        self.tables.load(Ordering::SeqCst)
    }

    fn limit(&self) -> Option<usize> {
        self.limit
    }
}

/// The manager for an optional byte limit.
pub fn memory_manager(limit: Option<usize>) -> Arc<dyn MemoryManager> {
    match limit {
        Some(limit) => Arc::new(MemoryBudget::new(limit)),
        None => Arc::new(UnboundedMemory),
    }
}

/// One table's share of a [`MemoryManager`], returned on drop.
#[derive(Debug)]
pub struct TableReservation {
    alloc: Arc<dyn MemoryManager>,
    bytes: usize,
}

impl TableReservation {
    /// Admit a table of `bytes` into `alloc`.
    pub fn acquire(alloc: &Arc<dyn MemoryManager>, bytes: usize) -> TidalResult<Self> {
        alloc.admit_table(bytes)?;
        Ok(Self {
            alloc: Arc::clone(alloc),
            bytes,
        })
    }

    /// Bytes held for the table.
    pub const fn bytes(&self) -> usize {
        self.bytes
    }
}

impl Drop for TableReservation {
    fn drop(&mut self) {
        self.alloc.release_table(self.bytes);
    }
}
