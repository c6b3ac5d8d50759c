//! Scenario verdicts and reports.

use std::time::Duration;

use vigil_supervisor::CapturedOutput;

/// Phases of the scenario state machine, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    /// Reset persisted external state to a known baseline.
    Setup,
    /// Spawn participants and support processes.
    Launch,
    /// Apply scripted fault actions.
    Inject,
    /// Drive the interaction script into the client.
    Drive,
    /// Wait for the external system to make progress.
    Settle,
    /// Run the declared checks.
    Verify,
    /// Terminate everything; always reached.
    Teardown,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Setup => "setup",
            Self::Launch => "launch",
            Self::Inject => "inject",
            Self::Drive => "drive",
            Self::Settle => "settle",
            Self::Verify => "verify",
            Self::Teardown => "teardown",
        };
        f.write_str(s)
    }
}

/// Terminal verdict of one scenario run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Every verification succeeded.
    Passed,
    /// At least one verification mismatch; processes cleaned up normally.
    Failed,
    /// A phase could not complete at all (e.g. a launch failure).
    Errored,
}

impl Verdict {
    /// True only for [`Verdict::Passed`].
    pub fn passed(self) -> bool {
        matches!(self, Self::Passed)
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Passed => "PASSED",
            Self::Failed => "FAILED",
            Self::Errored => "ERRORED",
        };
        f.write_str(s)
    }
}

/// Everything one scenario run produced.
#[derive(Debug)]
pub struct ScenarioReport {
    /// Scenario name.
    pub scenario: String,
    /// Terminal verdict.
    pub verdict: Verdict,
    /// Last phase that ran before teardown.
    pub phase_reached: Phase,
    /// Human-readable verification mismatches and timeout reasons.
    pub mismatches: Vec<String>,
    /// Informational notes (soft expectations, abandoned interactions).
    pub notes: Vec<String>,
    /// Phase error for an `Errored` verdict.
    pub error: Option<String>,
    /// Captured output of managed processes; populated for non-`Passed`
    /// verdicts.
    pub process_output: Vec<(String, CapturedOutput)>,
    /// Wall-clock duration of the run, teardown included.
    pub duration: Duration,
}

impl std::fmt::Display for ScenarioReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "----- Scenario Summary -----")?;
        writeln!(f, "scenario: {}", self.scenario)?;
        writeln!(f, "RESULT: {}", self.verdict)?;
        if let Some(error) = &self.error {
            writeln!(f, "error in {} phase: {error}", self.phase_reached)?;
        }
        for mismatch in &self.mismatches {
            writeln!(f, "  - {mismatch}")?;
        }
        for note in &self.notes {
            writeln!(f, "  note: {note}")?;
        }
        for (name, output) in &self.process_output {
            if !output.stdout.is_empty() {
                writeln!(f, "--- Captured STDOUT for {name} ---")?;
                writeln!(f, "{}", output.stdout.trim_end())?;
            }
            if !output.stderr.is_empty() {
                writeln!(f, "--- Captured STDERR for {name} ---")?;
                writeln!(f, "{}", output.stderr.trim_end())?;
            }
        }
        write!(f, "completed in {:.1}s", self.duration.as_secs_f64())
    }
}
