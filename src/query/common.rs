/*!
# Shared Types

This module contains shared types used by the evaluator and the query facade:
the cooperative cancellation handle and the runtime error type.
*/
use std::error::Error;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A cloneable handle used to abort a running query from any thread.
///
/// All clones share the same flag. The evaluator polls it between steps, so
/// cancellation takes effect promptly but never mid-step.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates a token that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Signals cancellation to every clone of this token.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Returns whether [`CancellationToken::cancel`] has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Returns `Err(QueryError::Cancelled)` once the token is cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Cancelled`] if cancellation was requested.
    pub fn check(&self) -> Result<(), QueryError> {
        if self.is_cancelled() {
            log::debug!("query evaluation cancelled");
            Err(QueryError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Errors raised while executing a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryError {
    /// The caller's cancellation token was signalled.
    Cancelled,
}

impl Error for QueryError {}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancelled => write!(f, "Query execution was cancelled"),
        }
    }
}
