//! Outcome verification.
//!
//! Every check runs to completion and reports all mismatches it finds;
//! verification is never short-circuited on the first failure.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::ObservedBlock;

/// One verification mismatch, in a human-readable kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Mismatch {
    /// No block has been committed, so there is no state to verify.
    NoBlocks,
    /// An expected address is absent from the final state snapshot.
    MissingAddress {
        /// The absent address.
        address: String,
    },
    /// The balance field for an address does not parse as a decimal.
    MalformedBalance {
        /// The address with the malformed balance.
        address: String,
        /// The raw balance field.
        raw: String,
    },
    /// A balance diverged from the expected value beyond tolerance.
    BalanceMismatch {
        /// The address in question.
        address: String,
        /// Expected balance.
        expected: f64,
        /// Observed balance.
        actual: f64,
    },
    /// A block appeared that the baseline says should not exist.
    UnexpectedBlock {
        /// Sequence number of the new block.
        sequence: u64,
    },
    /// Fewer blocks were committed than the scenario requires.
    BlockCount {
        /// Minimum number of blocks expected.
        expected_min: usize,
        /// Blocks actually observed.
        actual: usize,
    },
    /// The committed transaction total diverged from the submitted total.
    TransactionTotal {
        /// Transactions submitted by the scenario.
        expected: usize,
        /// Transactions observed across all blocks.
        actual: usize,
    },
    /// An already-observed sequence number changed its hash between polls.
    ///
    /// The store is append-only; this is a protocol violation by the
    /// system under test, not a harness error.
    RewrittenBlock {
        /// The sequence number whose record changed.
        sequence: u64,
        /// Hash observed earlier.
        previous: String,
        /// Hash observed now.
        current: String,
    },
    /// A balance drifted from what the committed transaction flow implies.
    ConservationViolation {
        /// The address in question.
        address: String,
        /// Balance implied by initial state plus committed transfers.
        expected: f64,
        /// Observed balance.
        actual: f64,
    },
}

impl std::fmt::Display for Mismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoBlocks => f.write_str("no committed block to verify against"),
            Self::MissingAddress { address } => write!(f, "missing address {address}"),
            Self::MalformedBalance { address, raw } => {
                write!(f, "invalid balance format for {address}: {raw:?}")
            }
            Self::BalanceMismatch { address, expected, actual } => {
                write!(f, "address {address}: expected {expected:.2}, got {actual:.2}")
            }
            Self::UnexpectedBlock { sequence } => {
                write!(f, "unexpected new block {sequence}")
            }
            Self::BlockCount { expected_min, actual } => {
                write!(f, "found only {actual} block(s), expected at least {expected_min}")
            }
            Self::TransactionTotal { expected, actual } => {
                write!(f, "transaction total: expected {expected}, got {actual}")
            }
            Self::RewrittenBlock { sequence, previous, current } => {
                write!(
                    f,
                    "block {sequence} was rewritten: hash {previous} changed to {current}"
                )
            }
            Self::ConservationViolation { address, expected, actual } => {
                write!(
                    f,
                    "address {address}: conservation expects {expected:.2}, got {actual:.2}"
                )
            }
        }
    }
}

/// Outcome of one verification pass: pass/fail plus every mismatch found
/// and any informational notes (soft expectations that do not fail).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VerificationResult {
    /// Mismatches, in discovery order.
    pub mismatches: Vec<Mismatch>,
    /// Informational notes (e.g. packing deviation).
    pub notes: Vec<String>,
}

impl VerificationResult {
    /// Empty (passing) result.
    pub fn pass() -> Self {
        Self::default()
    }

    /// True when no mismatch was found.
    pub fn passed(&self) -> bool {
        self.mismatches.is_empty()
    }

    /// Fold another result into this one, keeping order.
    pub fn merge(&mut self, other: Self) {
        self.mismatches.extend(other.mismatches);
        self.notes.extend(other.notes);
    }

    fn push(&mut self, mismatch: Mismatch) {
        self.mismatches.push(mismatch);
    }

    fn note(&mut self, note: String) {
        self.notes.push(note);
    }
}

impl std::fmt::Display for VerificationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.passed() {
            f.write_str("passed")?;
        } else {
            writeln!(f, "{} mismatch(es):", self.mismatches.len())?;
            for m in &self.mismatches {
                writeln!(f, "  - {m}")?;
            }
        }
        for n in &self.notes {
            write!(f, "\n  note: {n}")?;
        }
        Ok(())
    }
}

/// Compare the final state snapshot against expected balances.
///
/// Takes the snapshot of the last observed block (by sequence number). For
/// every expected address: absent, malformed, and out-of-tolerance values
/// are reported as distinct mismatch kinds.
pub fn verify_balances(
    blocks: &[ObservedBlock],
    expected: &BTreeMap<String, f64>,
    tolerance: f64,
) -> VerificationResult {
    let mut result = VerificationResult::pass();
    let Some(last) = blocks.iter().max_by_key(|b| b.sequence) else {
        result.push(Mismatch::NoBlocks);
        return result;
    };
    debug!(sequence = last.sequence, "verifying balances against last block");

    for (address, &want) in expected {
        match last.state.get(address) {
            None => result.push(Mismatch::MissingAddress { address: address.clone() }),
            Some(account) => match account.balance.trim().parse::<f64>() {
                Err(_) => result.push(Mismatch::MalformedBalance {
                    address: address.clone(),
                    raw: account.balance.clone(),
                }),
                Ok(actual) => {
                    if (actual - want).abs() > tolerance {
                        result.push(Mismatch::BalanceMismatch {
                            address: address.clone(),
                            expected: want,
                            actual,
                        });
                    }
                }
            },
        }
    }
    result
}

/// Assert that no block beyond the baseline has appeared.
///
/// Passes iff `current` is a subset of `baseline` — any new sequence
/// number fails, regardless of the block's content.
pub fn verify_no_new_blocks(
    baseline: &BTreeSet<u64>,
    current: &BTreeSet<u64>,
) -> VerificationResult {
    let mut result = VerificationResult::pass();
    for &sequence in current.difference(baseline) {
        result.push(Mismatch::UnexpectedBlock { sequence });
    }
    result
}

/// Assert that at least `expected_min` blocks have been committed.
pub fn verify_min_blocks(blocks: &[ObservedBlock], expected_min: usize) -> VerificationResult {
    let mut result = VerificationResult::pass();
    if blocks.len() < expected_min {
        result.push(Mismatch::BlockCount { expected_min, actual: blocks.len() });
    }
    result
}

/// Check exhaustive delivery of submitted transactions.
///
/// Hard requirement: transaction counts across all blocks sum to exactly
/// `total_submitted`. Deviation from the ideal packing of
/// `ceil(total / capacity)` blocks is reported as a note, never a
/// mismatch — packing is the target's scheduling policy, not a contract.
pub fn verify_distribution(
    blocks: &[ObservedBlock],
    capacity: usize,
    total_submitted: usize,
) -> VerificationResult {
    let mut result = VerificationResult::pass();
    let actual: usize = blocks.iter().map(|b| b.transactions.len()).sum();
    if actual != total_submitted {
        result.push(Mismatch::TransactionTotal { expected: total_submitted, actual });
    }

    if capacity > 0 {
        let ideal_blocks = total_submitted.div_ceil(capacity);
        if blocks.len() != ideal_blocks {
            result.note(format!(
                "packing deviates from ideal: {} block(s) for {} transaction(s) at capacity {} (ideal {})",
                blocks.len(),
                total_submitted,
                capacity,
                ideal_blocks
            ));
        }
        let counts: Vec<usize> = blocks.iter().map(|b| b.transactions.len()).collect();
        result.note(format!("per-block transaction counts: {counts:?}"));
    }
    result
}

/// Hashes of every sequence number observed so far, for append-only
/// enforcement across polls.
#[derive(Debug, Clone, Default)]
pub struct BlockHistory {
    seen: BTreeMap<u64, String>,
}

impl BlockHistory {
    /// Empty history.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Record the blocks of one poll into `history`, reporting any
/// already-seen sequence number whose hash changed.
pub fn verify_append_only(
    history: &mut BlockHistory,
    blocks: &[ObservedBlock],
) -> VerificationResult {
    let mut result = VerificationResult::pass();
    for block in blocks {
        match history.seen.get(&block.sequence) {
            Some(previous) if *previous != block.block_hash => {
                result.push(Mismatch::RewrittenBlock {
                    sequence: block.sequence,
                    previous: previous.clone(),
                    current: block.block_hash.clone(),
                });
            }
            Some(_) => {}
            None => {
                history.seen.insert(block.sequence, block.block_hash.clone());
            }
        }
    }
    result
}

/// Check balance conservation across every committed block.
///
/// For each address with a known initial balance, the final balance must
/// equal `initial + Σ(incoming) − Σ(outgoing)` over all committed
/// transactions, within tolerance.
pub fn verify_conservation(
    blocks: &[ObservedBlock],
    initial: &BTreeMap<String, f64>,
    tolerance: f64,
) -> VerificationResult {
    let mut result = VerificationResult::pass();
    let Some(last) = blocks.iter().max_by_key(|b| b.sequence) else {
        result.push(Mismatch::NoBlocks);
        return result;
    };

    let mut net: BTreeMap<&str, f64> = BTreeMap::new();
    for block in blocks {
        for tx in &block.transactions {
            let Some(amount) = tx.amount_value() else {
                continue;
            };
            *net.entry(tx.sender.as_str()).or_default() -= amount;
            *net.entry(tx.receiver.as_str()).or_default() += amount;
        }
    }

    for (address, &start) in initial {
        let expected = start + net.get(address.as_str()).copied().unwrap_or(0.0);
        match last.balance_of(address) {
            None => result.push(Mismatch::MissingAddress { address: address.clone() }),
            Some(actual) => {
                if (actual - expected).abs() > tolerance {
                    result.push(Mismatch::ConservationViolation {
                        address: address.clone(),
                        expected,
                        actual,
                    });
                }
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AccountState, Transaction};

    fn block(sequence: u64, txs: &[(&str, &str, f64)], state: &[(&str, &str)]) -> ObservedBlock {
        ObservedBlock {
            sequence,
            block_hash: format!("h{sequence}"),
            previous_block_hash: format!("h{}", sequence - 1),
            transactions: txs
                .iter()
                .map(|(s, r, a)| Transaction {
                    sender: (*s).to_owned(),
                    receiver: (*r).to_owned(),
                    amount: a.to_string(),
                })
                .collect(),
            state: state
                .iter()
                .map(|(addr, bal)| ((*addr).to_owned(), AccountState { balance: (*bal).to_owned() }))
                .collect(),
        }
    }

    const TOLERANCE: f64 = 0.001;

    #[test]
    fn test_balances_pass_within_tolerance() {
        let blocks = vec![block(1, &[], &[("0xAA", "65.0005"), ("0xBB", "120")])];
        let expected = [("0xAA".to_owned(), 65.0), ("0xBB".to_owned(), 120.0)].into();
        let result = verify_balances(&blocks, &expected, TOLERANCE);
        assert!(result.passed(), "{result}");
    }

    #[test]
    fn test_balances_report_all_mismatch_kinds() {
        let blocks = vec![block(1, &[], &[("0xAA", "50"), ("0xCC", "oops")])];
        let expected = [
            ("0xAA".to_owned(), 65.0),  // value mismatch
            ("0xBB".to_owned(), 100.0), // missing
            ("0xCC".to_owned(), 10.0),  // malformed
        ]
        .into();
        let result = verify_balances(&blocks, &expected, TOLERANCE);
        assert_eq!(result.mismatches.len(), 3);
        assert!(result
            .mismatches
            .iter()
            .any(|m| matches!(m, Mismatch::BalanceMismatch { address, .. } if address == "0xAA")));
        assert!(result
            .mismatches
            .iter()
            .any(|m| matches!(m, Mismatch::MissingAddress { address } if address == "0xBB")));
        assert!(result
            .mismatches
            .iter()
            .any(|m| matches!(m, Mismatch::MalformedBalance { address, .. } if address == "0xCC")));
    }

    #[test]
    fn test_balances_with_no_blocks() {
        let result = verify_balances(&[], &BTreeMap::new(), TOLERANCE);
        assert_eq!(result.mismatches, vec![Mismatch::NoBlocks]);
    }

    #[test]
    fn test_balances_use_last_block_by_sequence() {
        let blocks = vec![
            block(2, &[], &[("0xAA", "42")]),
            block(1, &[], &[("0xAA", "100")]),
        ];
        let expected = [("0xAA".to_owned(), 42.0)].into();
        assert!(verify_balances(&blocks, &expected, TOLERANCE).passed());
    }

    #[test]
    fn test_no_new_blocks_subset_passes() {
        let baseline: BTreeSet<u64> = [1, 2].into();
        assert!(verify_no_new_blocks(&baseline, &[1, 2].into()).passed());
        assert!(verify_no_new_blocks(&baseline, &[1].into()).passed());
        assert!(verify_no_new_blocks(&baseline, &BTreeSet::new()).passed());
    }

    #[test]
    fn test_no_new_blocks_fails_on_any_new_sequence() {
        let baseline: BTreeSet<u64> = [1].into();
        let result = verify_no_new_blocks(&baseline, &[1, 2, 3].into());
        assert_eq!(
            result.mismatches,
            vec![Mismatch::UnexpectedBlock { sequence: 2 }, Mismatch::UnexpectedBlock { sequence: 3 }]
        );
    }

    #[test]
    fn test_distribution_exact_total_any_packing() {
        // 12 transactions over capacity 3 but packed unevenly: still a pass,
        // with a packing note.
        let blocks = vec![
            block(1, &[("a", "b", 1.0); 4], &[]),
            block(2, &[("a", "b", 1.0); 4], &[]),
            block(3, &[("a", "b", 1.0); 4], &[]),
        ];
        let result = verify_distribution(&blocks, 3, 12);
        assert!(result.passed(), "{result}");
        assert!(result.notes.iter().any(|n| n.contains("packing deviates")));
    }

    #[test]
    fn test_distribution_ideal_packing_has_no_deviation_note() {
        let blocks = vec![
            block(1, &[("a", "b", 1.0); 3], &[]),
            block(2, &[("a", "b", 1.0); 3], &[]),
            block(3, &[("a", "b", 1.0); 3], &[]),
            block(4, &[("a", "b", 1.0); 3], &[]),
        ];
        let result = verify_distribution(&blocks, 3, 12);
        assert!(result.passed());
        assert!(!result.notes.iter().any(|n| n.contains("packing deviates")));
    }

    #[test]
    fn test_distribution_lost_transaction_fails() {
        let blocks = vec![block(1, &[("a", "b", 1.0); 3], &[])];
        let result = verify_distribution(&blocks, 3, 4);
        assert_eq!(
            result.mismatches,
            vec![Mismatch::TransactionTotal { expected: 4, actual: 3 }]
        );
    }

    #[test]
    fn test_append_only_detects_rewritten_block() {
        let mut history = BlockHistory::new();
        let first = vec![block(1, &[], &[])];
        assert!(verify_append_only(&mut history, &first).passed());

        // Same sequence, same hash: fine.
        assert!(verify_append_only(&mut history, &first).passed());

        let mut rewritten = block(1, &[], &[]);
        rewritten.block_hash = "different".to_owned();
        let result = verify_append_only(&mut history, &[rewritten]);
        assert!(matches!(
            result.mismatches.as_slice(),
            [Mismatch::RewrittenBlock { sequence: 1, .. }]
        ));
    }

    #[test]
    fn test_conservation_across_blocks() {
        let blocks = vec![
            block(1, &[("0xAA", "0xBB", 20.0)], &[("0xAA", "80"), ("0xBB", "120")]),
            block(
                2,
                &[("0xAA", "0xCC", 15.0)],
                &[("0xAA", "65"), ("0xBB", "120"), ("0xCC", "115")],
            ),
        ];
        let initial = [
            ("0xAA".to_owned(), 100.0),
            ("0xBB".to_owned(), 100.0),
            ("0xCC".to_owned(), 100.0),
        ]
        .into();
        let result = verify_conservation(&blocks, &initial, TOLERANCE);
        assert!(result.passed(), "{result}");
    }

    #[test]
    fn test_conservation_violation_reported() {
        let blocks = vec![block(1, &[("0xAA", "0xBB", 20.0)], &[("0xAA", "80"), ("0xBB", "130")])];
        let initial = [("0xAA".to_owned(), 100.0), ("0xBB".to_owned(), 100.0)].into();
        let result = verify_conservation(&blocks, &initial, TOLERANCE);
        assert_eq!(
            result.mismatches,
            vec![Mismatch::ConservationViolation {
                address: "0xBB".to_owned(),
                expected: 120.0,
                actual: 130.0
            }]
        );
    }

    #[test]
    fn test_merge_keeps_order_and_notes() {
        let mut a = VerificationResult::pass();
        a.push(Mismatch::NoBlocks);
        let mut b = VerificationResult::pass();
        b.note("soft note".to_owned());
        a.merge(b);
        assert_eq!(a.mismatches.len(), 1);
        assert_eq!(a.notes.len(), 1);
        assert!(!a.passed());
    }
}
