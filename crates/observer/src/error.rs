//! Error types for state observation.

use std::time::Duration;

use thiserror::Error;

/// Error type for observer operations.
#[derive(Debug, Error)]
pub enum ObserverError {
    /// The expected condition was never observed within the deadline.
    #[error("observation timed out after {waited:?} ({blocks_seen} block(s) observed)")]
    Timeout {
        /// How long the observer polled.
        waited: Duration,
        /// Blocks parseable at the last poll.
        blocks_seen: usize,
    },

    /// The enclosing scenario aborted the poll.
    #[error("observation aborted: {0}")]
    Aborted(String),
}
