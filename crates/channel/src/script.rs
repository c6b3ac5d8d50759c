//! Interaction scripts.
//!
//! The client's command protocol is one newline-terminated token per line:
//! `"1"` begins a transfer (followed by a receiver line and an amount
//! line), `"2"` queries the balance, `"0"` exits. A script is consumed
//! once, left-to-right; there is no replay.

/// Command selector token for a transfer.
pub const SELECT_TRANSFER: &str = "1";

/// Command selector token for a balance query.
pub const SELECT_BALANCE: &str = "2";

/// Command selector token for a graceful exit.
pub const SELECT_EXIT: &str = "0";

/// One step of an interaction script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractionStep {
    /// Submit a transfer to `receiver` of `amount` (decimal string).
    SubmitTransfer {
        /// Receiver identifier, as the client understands it.
        receiver: String,
        /// Amount, as a decimal string.
        amount: String,
    },
    /// Query the driven client's balance; the response is not consumed.
    QueryBalance,
    /// Exit the client; the input channel is closed afterwards.
    Exit,
}

impl InteractionStep {
    /// The discrete tokens this step expands into, in emission order.
    pub fn tokens(&self) -> Vec<&str> {
        match self {
            Self::SubmitTransfer { receiver, amount } => {
                vec![SELECT_TRANSFER, receiver, amount]
            }
            Self::QueryBalance => vec![SELECT_BALANCE],
            Self::Exit => vec![SELECT_EXIT],
        }
    }
}

/// An ordered sequence of interaction steps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InteractionScript {
    steps: Vec<InteractionStep>,
}

impl InteractionScript {
    /// Empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a transfer step.
    pub fn transfer(mut self, receiver: &str, amount: &str) -> Self {
        self.steps.push(InteractionStep::SubmitTransfer {
            receiver: receiver.to_owned(),
            amount: amount.to_owned(),
        });
        self
    }

    /// Append a balance query step.
    pub fn query_balance(mut self) -> Self {
        self.steps.push(InteractionStep::QueryBalance);
        self
    }

    /// Append an exit step.
    pub fn exit(mut self) -> Self {
        self.steps.push(InteractionStep::Exit);
        self
    }

    /// The steps, in order.
    pub fn steps(&self) -> &[InteractionStep] {
        &self.steps
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// True when the script has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Number of transfer steps; the submitted-transaction total used by
    /// distribution verification.
    pub fn transfer_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| matches!(s, InteractionStep::SubmitTransfer { .. }))
            .count()
    }
}
