//! Error types for process supervision.

use thiserror::Error;

/// Error type for supervisor operations.
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// The launch command could not be started.
    #[error("failed to launch {name} ({command}): {source}")]
    Launch {
        /// Logical process name.
        name: String,
        /// Rendered command line.
        command: String,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// No process with the given logical name is tracked.
    #[error("unknown process: {0}")]
    Unknown(String),

    /// A tracked process could not be terminated.
    #[error("failed to terminate {name}: {source}")]
    Terminate {
        /// Logical process name.
        name: String,
        /// The underlying IO error.
        source: std::io::Error,
    },
}
