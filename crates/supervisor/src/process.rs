//! Managed process records.

/// Lifecycle state of a managed process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    /// Spawned, pid not yet confirmed.
    Starting,
    /// The OS confirmed the process identifier exists.
    Running,
    /// Exited or was terminated by the supervisor.
    Terminated,
    /// Could not be started or tracked further.
    Failed,
}

impl std::fmt::Display for ProcessState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Terminated => "terminated",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Output drained from a captured process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedOutput {
    /// Everything the process wrote to stdout.
    pub stdout: String,
    /// Everything the process wrote to stderr.
    pub stderr: String,
}

impl CapturedOutput {
    /// True when neither stream produced anything.
    pub fn is_empty(&self) -> bool {
        self.stdout.is_empty() && self.stderr.is_empty()
    }
}

/// Record of one spawned OS process.
///
/// Owned exclusively by the [`ProcessSupervisor`](crate::ProcessSupervisor)
/// that spawned it; other components refer to it by logical name only.
#[derive(Debug, Clone)]
pub struct ManagedProcess {
    /// Logical name, unique within one supervisor.
    pub name: String,
    /// Rendered command line, for diagnostics.
    pub command: String,
    /// OS process identifier, if confirmed.
    pub pid: Option<u32>,
    /// Lifecycle state.
    pub state: ProcessState,
    /// Exit code, once the process has been reaped.
    pub exit_code: Option<i32>,
    /// Captured output, attached when the process is terminated.
    pub output: Option<CapturedOutput>,
}

impl ManagedProcess {
    pub(crate) fn new(name: &str, command: String) -> Self {
        Self {
            name: name.to_owned(),
            command,
            pid: None,
            state: ProcessState::Starting,
            exit_code: None,
            output: None,
        }
    }
}
