//! Simulated keyboard delivery.
//!
//! Some builds of the target client only accept input from a real terminal
//! window. This variant brings the client's window to the foreground
//! (best-effort) and emits keystrokes through an [`InputAutomation`]
//! capability. The harness itself never touches OS window or keyboard
//! APIs; scenario logic depends only on the capability interface.

use std::time::Duration;

use tracing::{debug, warn};

use crate::{ChannelError, InteractionScript, InteractionStep};

/// Identifies the window the keystrokes should land in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusTarget {
    /// OS process identifier, when known.
    pub pid: Option<u32>,
    /// Window title, used as a fallback lookup key.
    pub title: String,
}

impl FocusTarget {
    /// Target a window by title, optionally with a pid.
    pub fn new(title: &str, pid: Option<u32>) -> Self {
        Self { pid, title: title.to_owned() }
    }
}

/// Host input automation capability.
///
/// Implementations wrap whatever the host OS offers for window focus and
/// keystroke injection. The harness ships no OS backend; tests use a
/// recording fake.
pub trait InputAutomation: Send {
    /// Bring the target's window to the foreground. Returns whether focus
    /// was obtained; failure is non-fatal.
    fn focus(&mut self, target: &FocusTarget) -> bool;

    /// Type one token and commit it with the enter key.
    fn commit_line(&mut self, text: &str) -> std::io::Result<()>;
}

/// Emits a script as keystroke events with a fixed per-token settle delay.
pub struct SimulatedInput {
    automation: Box<dyn InputAutomation>,
}

impl SimulatedInput {
    /// Wrap an automation backend.
    pub fn new(automation: Box<dyn InputAutomation>) -> Self {
        Self { automation }
    }

    /// Deliver a script to the focused window, strictly in order.
    ///
    /// Focus failure is logged and delivery proceeds anyway — the window
    /// may already have focus. A keystroke failure abandons the remaining
    /// steps with [`ChannelError::Broken`].
    pub async fn send(
        &mut self,
        target: &FocusTarget,
        script: InteractionScript,
        inter_step: Duration,
    ) -> Result<(), ChannelError> {
        if !self.automation.focus(target) {
            warn!(title = %target.title, pid = ?target.pid, "could not focus client window, sending anyway");
        }

        for (index, step) in script.steps().iter().enumerate() {
            for token in step.tokens() {
                self.automation
                    .commit_line(token)
                    .map_err(|source| ChannelError::Broken { steps_completed: index, source })?;
                tokio::time::sleep(inter_step).await;
            }
            if matches!(step, InteractionStep::Exit) {
                debug!("exit delivered");
                break;
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for SimulatedInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulatedInput").finish_non_exhaustive()
    }
}
