//! Direct input stream delivery.

use std::time::Duration;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, trace};

use crate::{ChannelError, InteractionScript, InteractionStep};

/// Writes newline-terminated tokens to the target process's input stream.
#[derive(Debug)]
pub struct DirectStream<W> {
    writer: W,
}

impl<W: AsyncWrite + Unpin> DirectStream<W> {
    /// Wrap an input stream (typically the client's piped stdin).
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Deliver a script, strictly in order, honoring `inter_step` between
    /// tokens.
    ///
    /// The delay exists because the target consumes its input buffer slower
    /// than the harness can fill it; back-to-back tokens interleave
    /// commands inside the client. That pacing is part of the target's
    /// protocol and must come from configuration.
    ///
    /// After an [`InteractionStep::Exit`] the stream is shut down. On a
    /// write failure the remaining steps are abandoned and
    /// [`ChannelError::Broken`] is returned.
    pub async fn send(
        &mut self,
        script: InteractionScript,
        inter_step: Duration,
    ) -> Result<(), ChannelError> {
        for (index, step) in script.steps().iter().enumerate() {
            trace!(?step, index, "delivering step");
            for token in step.tokens() {
                self.commit_token(token, index).await?;
                tokio::time::sleep(inter_step).await;
            }
            if matches!(step, InteractionStep::Exit) {
                debug!("exit delivered, closing input stream");
                // Close failures after exit are uninteresting; the client
                // already has everything it needs.
                let _ = self.writer.shutdown().await;
                break;
            }
        }
        Ok(())
    }

    async fn commit_token(&mut self, token: &str, steps_completed: usize) -> Result<(), ChannelError> {
        let broken = |source| ChannelError::Broken { steps_completed, source };
        self.writer.write_all(token.as_bytes()).await.map_err(broken)?;
        self.writer.write_all(b"\n").await.map_err(broken)?;
        self.writer.flush().await.map_err(broken)?;
        Ok(())
    }

    /// The underlying writer.
    pub fn get_ref(&self) -> &W {
        &self.writer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_DELAY: Duration = Duration::ZERO;

    #[tokio::test]
    async fn test_tokens_are_newline_terminated_in_order() {
        let mut stream = DirectStream::new(Vec::new());
        let script = InteractionScript::new().transfer("Miguel", "20").query_balance();
        stream.send(script, NO_DELAY).await.unwrap();

        let written = String::from_utf8(stream.get_ref().clone()).unwrap();
        assert_eq!(written, "1\nMiguel\n20\n2\n");
    }

    #[tokio::test]
    async fn test_exit_stops_delivery() {
        let mut stream = DirectStream::new(Vec::new());
        // Steps after the exit must never be delivered.
        let script = InteractionScript::new().exit().transfer("Miguel", "20");
        stream.send(script, NO_DELAY).await.unwrap();

        let written = String::from_utf8(stream.get_ref().clone()).unwrap();
        assert_eq!(written, "0\n");
    }

    #[tokio::test]
    async fn test_closed_stream_is_broken_channel() {
        let (tx, rx) = tokio::io::duplex(16);
        drop(rx);

        let mut stream = DirectStream::new(tx);
        let script = InteractionScript::new().transfer("Miguel", "20").exit();
        let err = stream.send(script, NO_DELAY).await.unwrap_err();
        assert!(matches!(err, ChannelError::Broken { .. }));
    }
}
