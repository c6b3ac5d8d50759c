//! Direct filesystem reads of the committed block directory.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::ObservedBlock;

/// Reader over the external system's block directory.
///
/// Blocks live one per file, named `block<N>.json` with `N` monotonically
/// increasing from 1. The store never writes; re-reads are expected because
/// the directory grows between polls.
#[derive(Debug, Clone)]
pub struct BlockStore {
    dir: PathBuf,
}

impl BlockStore {
    /// Store over the given directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The directory being observed.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Read and parse every currently available block, ordered by sequence
    /// number.
    ///
    /// A missing directory reads as empty (the external system may not have
    /// created it yet). Files whose names don't match the pattern are
    /// ignored; files that fail to parse are treated as not yet available.
    pub fn read_all(&self) -> Vec<ObservedBlock> {
        let Ok(entries) = std::fs::read_dir(&self.dir) else {
            debug!(dir = %self.dir.display(), "block directory not readable yet");
            return Vec::new();
        };

        let mut blocks = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            let Some(sequence) = sequence_of(&path) else {
                continue;
            };
            let Ok(body) = std::fs::read_to_string(&path) else {
                continue;
            };
            match ObservedBlock::parse(sequence, &body) {
                Some(block) => blocks.push(block),
                None => debug!(sequence, path = %path.display(), "block not parseable yet"),
            }
        }
        blocks.sort_by_key(|b| b.sequence);
        blocks
    }

    /// Sequence numbers of every currently available (parseable or not)
    /// block file. Used as the baseline for no-new-blocks assertions, which
    /// must count a half-written file as present.
    pub fn baseline(&self) -> BTreeSet<u64> {
        let Ok(entries) = std::fs::read_dir(&self.dir) else {
            return BTreeSet::new();
        };
        entries.flatten().filter_map(|e| sequence_of(&e.path())).collect()
    }
}

/// Sequence number encoded in a block file name (`block<N>.json`).
fn sequence_of(path: &Path) -> Option<u64> {
    if path.extension().and_then(|e| e.to_str()) != Some("json") {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    stem.strip_prefix("block")?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_block(dir: &Path, sequence: u64, tx_count: usize) {
        let txs: Vec<String> = (0..tx_count)
            .map(|i| format!(r#"{{"sender": "a", "receiver": "b", "amount": "{i}"}}"#))
            .collect();
        let body = format!(
            r#"{{"block_hash": "h{sequence}", "previous_block_hash": "h{}", "transactions": [{}], "state": {{}}}}"#,
            sequence - 1,
            txs.join(",")
        );
        std::fs::write(dir.join(format!("block{sequence}.json")), body).unwrap();
    }

    #[test]
    fn test_missing_directory_reads_empty() {
        let store = BlockStore::new("/nonexistent/blocks");
        assert!(store.read_all().is_empty());
        assert!(store.baseline().is_empty());
    }

    #[test]
    fn test_reads_ordered_by_sequence() {
        let dir = tempfile::tempdir().unwrap();
        write_block(dir.path(), 2, 1);
        write_block(dir.path(), 1, 3);
        write_block(dir.path(), 10, 2);

        let store = BlockStore::new(dir.path());
        let blocks = store.read_all();
        let sequences: Vec<u64> = blocks.iter().map(|b| b.sequence).collect();
        assert_eq!(sequences, vec![1, 2, 10]);
        assert_eq!(blocks[0].transactions.len(), 3);
    }

    #[test]
    fn test_ignores_unrelated_and_unparseable_files() {
        let dir = tempfile::tempdir().unwrap();
        write_block(dir.path(), 1, 1);
        std::fs::write(dir.path().join("notes.txt"), "hi").unwrap();
        std::fs::write(dir.path().join("genesis.json"), "{}").unwrap();
        // Mid-write record: present in the baseline, absent from read_all.
        std::fs::write(dir.path().join("block2.json"), r#"{"block_hash": "tru"#).unwrap();

        let store = BlockStore::new(dir.path());
        let blocks = store.read_all();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].sequence, 1);

        let baseline = store.baseline();
        assert_eq!(baseline, [1, 2].into_iter().collect());
    }
}
