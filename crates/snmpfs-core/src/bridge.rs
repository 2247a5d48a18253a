//! Blocking entry point into the SNMP client's runtime.
//!
//! The cache manager is synchronous and the SNMP client is async. Each
//! request to the agent (session setup, a whole bulk walk) goes through
//! [`execute`], which runs it on the transport's runtime under a deadline
//! and counts the outcome in [`BridgeStats`].

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::oneshot;

/// Counters for requests sent to the agent.
#[derive(Debug, Default)]
pub struct BridgeStats {
    started: AtomicU64,
    completed: AtomicU64,
    timed_out: AtomicU64,
}

/// Point-in-time copy of [`BridgeStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BridgeSnapshot {
    pub started: u64,
    /// Requests whose future finished, successfully or not.
    pub completed: u64,
    /// Requests cut off by the deadline.
    pub timed_out: u64,
}

impl BridgeSnapshot {
    /// Requests neither completed nor timed out (cancelled or still running).
    pub fn unfinished(&self) -> u64 {
        self.started
            .saturating_sub(self.completed)
            .saturating_sub(self.timed_out)
    }
}

impl fmt::Display for BridgeSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} started, {} completed, {} timed out",
            self.started, self.completed, self.timed_out
        )
    }
}

impl BridgeStats {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn snapshot(&self) -> BridgeSnapshot {
        BridgeSnapshot {
            started: self.started.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            timed_out: self.timed_out.load(Ordering::Relaxed),
        }
    }
}

/// Error from bridged operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BridgeError {
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("operation was cancelled")]
    Cancelled,
}

/// Runs `future` on `handle` and blocks until it finishes or `timeout`
/// passes. A timed-out request is aborted, so its socket work stops too.
///
/// Must not be called from inside a tokio runtime thread.
pub fn execute<F, T>(
    handle: &Handle,
    timeout: Duration,
    stats: &BridgeStats,
    future: F,
) -> Result<T, BridgeError>
where
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    stats.started.fetch_add(1, Ordering::Relaxed);

    let (tx, rx) = oneshot::channel();
    let task = handle.spawn(async move {
        let _ = tx.send(tokio::time::timeout(timeout, future).await);
    });

    let outcome = rx.blocking_recv();
    match outcome {
        Ok(Ok(value)) => {
            stats.completed.fetch_add(1, Ordering::Relaxed);
            Ok(value)
        }
        Ok(Err(_elapsed)) => {
            task.abort();
            stats.timed_out.fetch_add(1, Ordering::Relaxed);
            Err(BridgeError::Timeout(timeout))
        }
        Err(_) => {
            task.abort();
            Err(BridgeError::Cancelled)
        }
    }
}
