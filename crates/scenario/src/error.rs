//! Error types for scenario execution.

use thiserror::Error;

/// Error type for scenario harness failures.
///
/// These are failures of the harness itself; failures of the system under
/// test are verdicts ([`Verdict::Failed`](crate::Verdict::Failed) or
/// [`Verdict::Errored`](crate::Verdict::Errored)) inside the report, not
/// errors.
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// The single-threaded runtime could not be built.
    #[error("failed to build scenario runtime: {0}")]
    Runtime(std::io::Error),

    /// No scenario with the given name exists in the library.
    #[error("unknown scenario: {0}")]
    UnknownScenario(String),
}
