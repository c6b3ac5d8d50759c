//! Scenario specifications.

use std::collections::BTreeMap;

use vigil_channel::InteractionScript;

/// Default numeric tolerance for balance comparisons.
pub const DEFAULT_TOLERANCE: f64 = 0.001;

/// One expected outcome a scenario verifies after settling.
#[derive(Debug, Clone, PartialEq)]
pub enum ExpectedOutcome {
    /// The last committed block's state snapshot matches these balances.
    Balances {
        /// Address to expected balance.
        expected: BTreeMap<String, f64>,
        /// Comparison tolerance.
        tolerance: f64,
    },
    /// At least this many blocks have been committed.
    MinBlocks(usize),
    /// Every submitted transfer was committed, across any block packing.
    Distribution,
    /// No block beyond the pre-Drive baseline appears.
    NoNewBlocks,
    /// Final balances are conserved against the committed transaction flow.
    Conservation {
        /// Address to initial balance.
        initial: BTreeMap<String, f64>,
        /// Comparison tolerance.
        tolerance: f64,
    },
}

/// A named scenario: who misbehaves, who crashes, what the client is asked
/// to do, and what the external system is expected to commit.
///
/// Cluster-wide constants (participant names, fault tolerance, block
/// capacity) live in the harness configuration; the spec holds only what
/// varies per scenario.
#[derive(Debug, Clone)]
pub struct ScenarioSpec {
    name: String,
    byzantine: Vec<(String, String)>,
    crash: Vec<String>,
    script: InteractionScript,
    expectations: Vec<ExpectedOutcome>,
    expect_quorum: Option<bool>,
}

impl ScenarioSpec {
    /// New empty scenario with the given name.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            byzantine: Vec::new(),
            crash: Vec::new(),
            script: InteractionScript::new(),
            expectations: Vec::new(),
            expect_quorum: None,
        }
    }

    /// Declare a participant Byzantine with the given behavior tag. Applied
    /// at launch time; the tag ends up in the participant's arguments.
    pub fn with_byzantine(mut self, participant: &str, behavior: &str) -> Self {
        self.byzantine.push((participant.to_owned(), behavior.to_owned()));
        self
    }

    /// Crash these participants at the Inject point.
    pub fn with_crash(mut self, participants: &[&str]) -> Self {
        self.crash.extend(participants.iter().map(|p| (*p).to_owned()));
        self
    }

    /// The interaction script driven into the client.
    pub fn with_script(mut self, script: InteractionScript) -> Self {
        self.script = script;
        self
    }

    /// Add an expected outcome; all of them are verified.
    pub fn expect(mut self, outcome: ExpectedOutcome) -> Self {
        self.expectations.push(outcome);
        self
    }

    /// Advisory: whether the author expects quorum to hold after Inject.
    /// Divergence is reported as a note, never a failure — the harness does
    /// not gate consensus.
    pub fn expect_quorum(mut self, expected: bool) -> Self {
        self.expect_quorum = Some(expected);
        self
    }

    /// Scenario name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Byzantine declarations, in order.
    pub fn byzantine(&self) -> &[(String, String)] {
        &self.byzantine
    }

    /// Participants crashed at Inject.
    pub fn crash(&self) -> &[String] {
        &self.crash
    }

    /// The interaction script.
    pub fn script(&self) -> &InteractionScript {
        &self.script
    }

    /// Expected outcomes.
    pub fn expectations(&self) -> &[ExpectedOutcome] {
        &self.expectations
    }

    /// Advisory quorum expectation, if any.
    pub fn quorum_expectation(&self) -> Option<bool> {
        self.expect_quorum
    }
}
