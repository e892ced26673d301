//! Provides a token-based mechanism for cancelling a request's pipeline.

use crate::errors::{Error, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A token that signals cancellation to a running pipeline.
///
/// This struct is a cloneable, thread-safe wrapper around an `Arc<AtomicBool>`.
/// The web layer cancels it when a request's deadline elapses or its client
/// goes away; the blocking pipeline stages poll it at their checkpoints
/// (between download chunks, zip entries and walked tree entries).
///
/// # Examples
///
/// ```
/// use repotar::CancellationToken;
/// use std::thread;
/// use std::time::Duration;
///
/// let token = CancellationToken::new();
/// let token_clone = token.clone();
///
/// let handle = thread::spawn(move || {
///     while !token_clone.is_cancelled() {
///         thread::sleep(Duration::from_millis(10));
///     }
/// });
///
/// token.cancel();
/// handle.join().unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct CancellationToken {
    inner: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates a new `CancellationToken` in a non-cancelled state.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(AtomicBool::new(false)), // false means not cancelled
        }
    }

    /// Signals cancellation to this token and all of its clones.
    pub fn cancel(&self) {
        self.inner.store(true, Ordering::SeqCst);
    }

    /// Checks if the token has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.inner.load(Ordering::Relaxed)
    }

    /// Returns `Err(Error::Cancelled)` once the token has been cancelled.
    ///
    /// Pipeline stages call this at their checkpoints and propagate with `?`.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Returns a guard that cancels this token when dropped.
    ///
    /// Held by an async request handler so that dropping the handler (client
    /// disconnect) stops the blocking work it spawned.
    pub fn cancel_on_drop(&self) -> CancelOnDrop {
        CancelOnDrop {
            token: self.clone(),
        }
    }
}

/// Creates a new `CancellationToken` in a non-cancelled state.
///
/// ```
/// use repotar::CancellationToken;
///
/// let token: CancellationToken = Default::default();
/// assert!(!token.is_cancelled());
/// ```
impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Cancels its token when dropped. See [`CancellationToken::cancel_on_drop`].
#[derive(Debug)]
pub struct CancelOnDrop {
    token: CancellationToken,
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
