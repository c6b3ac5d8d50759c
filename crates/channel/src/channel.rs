//! The interaction channel capability.

use std::time::Duration;

use tokio::io::AsyncWrite;

use crate::{ChannelError, DirectStream, FocusTarget, InputAutomation, InteractionScript, SimulatedInput};

type BoxedWriter = Box<dyn AsyncWrite + Unpin + Send>;

/// Capability for delivering a script into a live client, in one of two
/// variants. Scenario logic depends only on this interface, never on how
/// the tokens physically reach the client.
pub enum InteractionChannel {
    /// Tokens written straight into the client's input stream.
    Direct(DirectStream<BoxedWriter>),
    /// Keystrokes into the client's focused window.
    Simulated {
        /// The automation-backed emitter.
        input: SimulatedInput,
        /// The window to focus.
        target: FocusTarget,
    },
}

impl InteractionChannel {
    /// Channel over the client's piped input stream.
    pub fn direct(writer: impl AsyncWrite + Unpin + Send + 'static) -> Self {
        Self::Direct(DirectStream::new(Box::new(writer)))
    }

    /// Channel over a host input automation capability.
    pub fn simulated(automation: Box<dyn InputAutomation>, target: FocusTarget) -> Self {
        Self::Simulated { input: SimulatedInput::new(automation), target }
    }

    /// Deliver a script, consuming it, with `inter_step` between tokens.
    pub async fn send(
        &mut self,
        script: InteractionScript,
        inter_step: Duration,
    ) -> Result<(), ChannelError> {
        match self {
            Self::Direct(stream) => stream.send(script, inter_step).await,
            Self::Simulated { input, target } => input.send(target, script, inter_step).await,
        }
    }
}

impl std::fmt::Debug for InteractionChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Direct(_) => f.write_str("InteractionChannel::Direct"),
            Self::Simulated { target, .. } => {
                f.debug_struct("InteractionChannel::Simulated").field("target", target).finish()
            }
        }
    }
}
