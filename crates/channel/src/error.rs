//! Error types for interaction channels.

use thiserror::Error;

/// Error type for interaction channel operations.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The channel to the client broke mid-script.
    ///
    /// Raised when the input stream is closed or the target process has
    /// exited. Non-fatal to the enclosing scenario: the remaining steps of
    /// the current script are abandoned, but teardown and verification
    /// still proceed.
    #[error("interaction channel broken after {steps_completed} step(s): {source}")]
    Broken {
        /// Steps fully delivered before the break.
        steps_completed: usize,
        /// The underlying IO error.
        source: std::io::Error,
    },
}
