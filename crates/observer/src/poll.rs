//! Bounded retry polling.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, trace};

use crate::{BlockStore, ObservedBlock, ObserverError};

/// Pacing of one polling loop.
#[derive(Debug, Clone, Copy)]
pub struct PollOptions {
    /// Interval between polls.
    pub interval: Duration,
    /// Total deadline; the poll fails once this elapses.
    pub deadline: Duration,
}

/// Re-read the block store at `interval` until `predicate` holds over the
/// currently parseable blocks, or `deadline` elapses.
///
/// Each tick re-reads and re-parses every discovered record; records that
/// fail to parse are simply absent from the slice the predicate sees. The
/// `cancel` hook lets the enclosing scenario abort the poll early (for
/// example when a support process died); returning `Some(reason)` stops
/// the loop with [`ObserverError::Aborted`].
pub async fn poll_until(
    store: &BlockStore,
    mut predicate: impl FnMut(&[ObservedBlock]) -> bool,
    opts: PollOptions,
    mut cancel: impl FnMut() -> Option<String>,
) -> Result<Vec<ObservedBlock>, ObserverError> {
    let started = Instant::now();
    loop {
        if let Some(reason) = cancel() {
            debug!(%reason, "poll aborted");
            return Err(ObserverError::Aborted(reason));
        }

        let blocks = store.read_all();
        trace!(blocks = blocks.len(), "poll tick");
        if predicate(&blocks) {
            return Ok(blocks);
        }

        let waited = started.elapsed();
        if waited >= opts.deadline {
            debug!(?waited, blocks = blocks.len(), "poll deadline elapsed");
            return Err(ObserverError::Timeout { waited, blocks_seen: blocks.len() });
        }

        let remaining = opts.deadline - waited;
        tokio::time::sleep(opts.interval.min(remaining)).await;
    }
}

/// No cancellation.
pub fn never_cancel() -> Option<String> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast() -> PollOptions {
        PollOptions { interval: Duration::from_millis(10), deadline: Duration::from_millis(300) }
    }

    fn write_block(dir: &std::path::Path, sequence: u64) {
        let body = format!(
            r#"{{"block_hash": "h{sequence}", "previous_block_hash": "p", "transactions": [], "state": {{}}}}"#
        );
        std::fs::write(dir.join(format!("block{sequence}.json")), body).unwrap();
    }

    #[tokio::test]
    async fn test_times_out_when_no_block_ever_appears() {
        let dir = tempfile::tempdir().unwrap();
        let store = BlockStore::new(dir.path());

        let err = poll_until(&store, |blocks| !blocks.is_empty(), fast(), never_cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, ObserverError::Timeout { blocks_seen: 0, .. }));
    }

    #[tokio::test]
    async fn test_succeeds_when_block_appears_mid_poll() {
        let dir = tempfile::tempdir().unwrap();
        let store = BlockStore::new(dir.path());

        let writer_dir = dir.path().to_owned();
        let writer = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            write_block(&writer_dir, 1);
        });

        let blocks = poll_until(
            &store,
            |blocks| !blocks.is_empty(),
            PollOptions { interval: Duration::from_millis(10), deadline: Duration::from_secs(5) },
            never_cancel,
        )
        .await
        .unwrap();
        assert_eq!(blocks[0].sequence, 1);
        writer.await.unwrap();
    }

    #[tokio::test]
    async fn test_unparseable_block_does_not_satisfy_predicate() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("block1.json"), "{half-writ").unwrap();
        let store = BlockStore::new(dir.path());

        let err = poll_until(&store, |blocks| !blocks.is_empty(), fast(), never_cancel)
            .await
            .unwrap_err();
        // Deadline reached while only unparseable data exists.
        assert!(matches!(err, ObserverError::Timeout { blocks_seen: 0, .. }));
    }

    #[tokio::test]
    async fn test_cancel_aborts_promptly() {
        let dir = tempfile::tempdir().unwrap();
        let store = BlockStore::new(dir.path());

        let mut ticks = 0;
        let err = poll_until(
            &store,
            |_| false,
            PollOptions { interval: Duration::from_millis(10), deadline: Duration::from_secs(60) },
            move || {
                ticks += 1;
                (ticks > 2).then(|| "support process exited".to_owned())
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ObserverError::Aborted(_)));
    }
}
