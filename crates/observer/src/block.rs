//! Parsed committed block records.

use std::collections::BTreeMap;

use serde::Deserialize;

/// One transaction inside a committed block.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Transaction {
    /// Sender address.
    pub sender: String,
    /// Receiver address.
    pub receiver: String,
    /// Amount, as a decimal string.
    pub amount: String,
}

impl Transaction {
    /// Amount as a float, when well-formed.
    pub fn amount_value(&self) -> Option<f64> {
        self.amount.trim().parse().ok()
    }
}

/// Per-address entry of a block's state snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AccountState {
    /// Balance, as a decimal string.
    pub balance: String,
}

#[derive(Debug, Deserialize)]
struct BlockRecord {
    block_hash: String,
    previous_block_hash: String,
    #[serde(default)]
    transactions: Vec<Transaction>,
    #[serde(default)]
    state: BTreeMap<String, AccountState>,
}

/// One committed block as observed in the external store.
///
/// Immutable once read. The sequence number comes from the file name, not
/// the record body, and starts at 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedBlock {
    /// Sequence number derived from the file name.
    pub sequence: u64,
    /// Hash of this block.
    pub block_hash: String,
    /// Hash of the preceding block.
    pub previous_block_hash: String,
    /// Ordered transactions committed in this block.
    pub transactions: Vec<Transaction>,
    /// State snapshot after applying this block: address to balance.
    pub state: BTreeMap<String, AccountState>,
}

impl ObservedBlock {
    /// Parse a block record from its JSON body.
    ///
    /// Returns `None` when the body does not (yet) parse — a record that is
    /// mid-write is "not yet available", not an error.
    pub fn parse(sequence: u64, body: &str) -> Option<Self> {
        let record: BlockRecord = serde_json::from_str(body).ok()?;
        Some(Self {
            sequence,
            block_hash: record.block_hash,
            previous_block_hash: record.previous_block_hash,
            transactions: record.transactions,
            state: record.state,
        })
    }

    /// Balance of an address in this block's snapshot, when present and
    /// well-formed.
    pub fn balance_of(&self, address: &str) -> Option<f64> {
        self.state.get(address).and_then(|a| a.balance.trim().parse().ok())
    }
}
