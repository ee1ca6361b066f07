//! Async runtime utilities for Tidal.
//!
//! Provides runtime management and cooperative cancellation.

use std::future::Future;

use common_error::{TidalError, TidalResult};
use tokio::runtime::Runtime;
use tokio::sync::watch;

/// Get or create a Tokio runtime for blocking operations.
pub fn get_runtime() -> TidalResult<Runtime> {
    Runtime::new().map_err(|e| TidalError::InternalError(format!("Failed to create runtime: {e}")))
}

/// Block on a future using the default runtime.
pub fn block_on<F: Future>(future: F) -> TidalResult<F::Output> {
    let runtime = get_runtime()?;
    Ok(runtime.block_on(future))
}

/// Handle for cancelling a running query.
///
/// Held by whoever owns the query; tokens handed to sources and readers
/// observe the cancellation.
#[derive(Debug, Clone)]
pub struct CancellationHandle {
    cancel_tx: watch::Sender<bool>,
}

impl CancellationHandle {
    /// Create a new cancellation handle and its token.
    pub fn new() -> (Self, CancellationToken) {
        let (tx, rx) = watch::channel(false);
        (Self { cancel_tx: tx }, CancellationToken { cancel_rx: rx })
    }

    /// Cancel the query.
    pub fn cancel(&self) {
        let _ = self.cancel_tx.send(true);
    }

    /// Check if cancelled.
    pub fn is_cancelled(&self) -> bool {
        *self.cancel_tx.borrow()
    }

    /// Create another token observing this handle.
    pub fn token(&self) -> CancellationToken {
        CancellationToken {
            cancel_rx: self.cancel_tx.subscribe(),
        }
    }
}

/// Read side of a [`CancellationHandle`].
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancel_rx: watch::Receiver<bool>,
}

impl CancellationToken {
    /// A token that is never cancelled.
    pub fn never() -> Self {
        let (_, rx) = watch::channel(false);
        Self { cancel_rx: rx }
    }

    /// Check if cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        *self.cancel_rx.borrow()
    }

    /// Return a cancellation error if cancellation was requested.
    pub fn check(&self, what: &str) -> TidalResult<()> {
        if self.is_cancelled() {
            return Err(TidalError::cancelled(what.to_string()));
        }
        Ok(())
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::never()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancellation() {
        let (handle, token) = CancellationHandle::new();
        let other = handle.token();

        assert!(!token.is_cancelled());
        assert!(token.check("read").is_ok());

        handle.cancel();
        assert!(handle.is_cancelled());
        assert!(token.is_cancelled());
        assert!(other.is_cancelled());
        assert!(token.check("read").is_err());
    }

    #[test]
    fn test_never_token() {
        let token = CancellationToken::never();
        assert!(!token.is_cancelled());
    }

    #[test]
    fn test_block_on() {
        let value = block_on(async { 40 + 2 }).unwrap();
        assert_eq!(value, 42);
    }
}
