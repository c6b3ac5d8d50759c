//! Built-in scenarios.
//!
//! The literal constants here — four members, one tolerated fault, block
//! capacity three, the named client addresses and their 100-unit starting
//! balances — are fixtures describing the reference deployment, matched by
//! the default [`HarnessConfig`](vigil_config::HarnessConfig). Point the
//! harness at a differently shaped deployment by overriding the config;
//! the scenario logic itself carries no cluster constants.

use std::collections::BTreeMap;

use vigil_channel::InteractionScript;

use crate::{ExpectedOutcome, ScenarioError, ScenarioSpec, DEFAULT_TOLERANCE};

/// Address of the driven client (the sender of every scripted transfer).
pub const ADDR_SENDER: &str = "0xFEDCBA9876543210FEDCBA9876543210FEDCBA98";

/// Address of the `Miguel` client.
pub const ADDR_MIGUEL: &str = "0xA1B2C3D4E5F6A7B8C9D0E1F2A3B4C5D6E7F8A9B0";

/// Address of the `Gamito` client.
pub const ADDR_GAMITO: &str = "0x11223344556677889900AABBCCDDEEFF11223344";

/// Two bystander addresses whose balances must never move.
pub const ADDR_BYSTANDERS: [&str; 2] = [
    "0x1234567890ABCDEF1234567890ABCDEF12345678",
    "0x5678ABCDEF1234567890ABCDEF1234567890ABCD",
];

/// Starting balance of every genesis account.
pub const INITIAL_BALANCE: f64 = 100.0;

/// Byzantine behavior: approve every proposal, valid or not.
pub const BEHAVIOR_YES_MAN: &str = "YES_MAN";

/// Byzantine behavior: reject every proposal, valid or not.
pub const BEHAVIOR_NO_MAN: &str = "NO_MAN";

fn genesis_balances() -> BTreeMap<String, f64> {
    let mut balances = BTreeMap::new();
    for addr in [ADDR_SENDER, ADDR_MIGUEL, ADDR_GAMITO] {
        balances.insert(addr.to_owned(), INITIAL_BALANCE);
    }
    for addr in ADDR_BYSTANDERS {
        balances.insert(addr.to_owned(), INITIAL_BALANCE);
    }
    balances
}

fn balances_after(deltas: &[(&str, f64)]) -> BTreeMap<String, f64> {
    let mut balances = genesis_balances();
    for (addr, delta) in deltas {
        if let Some(balance) = balances.get_mut(*addr) {
            *balance += delta;
        }
    }
    balances
}

/// Two valid transfers and a balance query; every account must land on its
/// expected final balance and conservation must hold across the run.
pub fn happy_path_transfer() -> ScenarioSpec {
    let script = InteractionScript::new()
        .transfer("Miguel", "20")
        .transfer("Gamito", "15")
        .query_balance()
        .exit();
    ScenarioSpec::new("happy-path-transfer")
        .with_script(script)
        .expect_quorum(true)
        .expect(ExpectedOutcome::Balances {
            expected: balances_after(&[
                (ADDR_SENDER, -35.0),
                (ADDR_MIGUEL, 20.0),
                (ADDR_GAMITO, 15.0),
            ]),
            tolerance: DEFAULT_TOLERANCE,
        })
        .expect(ExpectedOutcome::Conservation {
            initial: genesis_balances(),
            tolerance: DEFAULT_TOLERANCE,
        })
}

/// One member crashed before the transfer: 3 of 4 live keeps quorum, so a
/// single valid transfer still commits in exactly one new block.
pub fn member_down() -> ScenarioSpec {
    let script = InteractionScript::new().transfer("Miguel", "25").exit();
    ScenarioSpec::new("member-down")
        .with_crash(&["member4"])
        .with_script(script)
        .expect_quorum(true)
        .expect(ExpectedOutcome::MinBlocks(1))
        .expect(ExpectedOutcome::Balances {
            expected: balances_after(&[(ADDR_SENDER, -25.0), (ADDR_MIGUEL, 25.0)]),
            tolerance: DEFAULT_TOLERANCE,
        })
}

/// Three members crashed: only one participant remains live, quorum is
/// gone, and no block may ever appear.
pub fn quorum_loss() -> ScenarioSpec {
    let script = InteractionScript::new().transfer("Miguel", "25").exit();
    ScenarioSpec::new("quorum-loss")
        .with_crash(&["member1", "member2", "member3"])
        .with_script(script)
        .expect_quorum(false)
        .expect(ExpectedOutcome::NoNewBlocks)
}

/// Twelve transfers flooded in: whatever the per-block packing, the
/// committed transaction counts must sum to exactly twelve.
pub fn transaction_flood() -> ScenarioSpec {
    let mut script = InteractionScript::new();
    for amount in 1..=12u32 {
        script = script.transfer("Miguel", &amount.to_string());
    }
    ScenarioSpec::new("transaction-flood")
        .with_script(script.exit())
        .expect_quorum(true)
        .expect(ExpectedOutcome::Distribution)
}

/// A transfer exceeding the sender's balance: rejected, so zero new blocks
/// against the pre-Drive snapshot.
pub fn invalid_transfer() -> ScenarioSpec {
    let script = InteractionScript::new().transfer("jiraiya", "10000").exit();
    ScenarioSpec::new("invalid-transfer")
        .with_script(script)
        .expect_quorum(true)
        .expect(ExpectedOutcome::NoNewBlocks)
}

/// One member declared `NO_MAN` (rejects every valid proposal): the three
/// honest members still commit a valid transfer.
pub fn byzantine_no_man() -> ScenarioSpec {
    let script = InteractionScript::new().transfer("Miguel", "20").exit();
    ScenarioSpec::new("byzantine-no-man")
        .with_byzantine("member4", BEHAVIOR_NO_MAN)
        .with_script(script)
        .expect_quorum(true)
        .expect(ExpectedOutcome::MinBlocks(1))
        .expect(ExpectedOutcome::Balances {
            expected: balances_after(&[(ADDR_SENDER, -20.0), (ADDR_MIGUEL, 20.0)]),
            tolerance: DEFAULT_TOLERANCE,
        })
}

/// One member declared `YES_MAN` (approves every invalid proposal): an
/// invalid transfer still produces zero new blocks.
pub fn byzantine_yes_man() -> ScenarioSpec {
    let script = InteractionScript::new().transfer("jiraiya", "10000").exit();
    ScenarioSpec::new("byzantine-yes-man")
        .with_byzantine("member4", BEHAVIOR_YES_MAN)
        .with_script(script)
        .expect_quorum(true)
        .expect(ExpectedOutcome::NoNewBlocks)
}

/// Every built-in scenario, in documentation order.
pub fn all() -> Vec<ScenarioSpec> {
    vec![
        happy_path_transfer(),
        member_down(),
        quorum_loss(),
        transaction_flood(),
        invalid_transfer(),
        byzantine_no_man(),
        byzantine_yes_man(),
    ]
}

/// Look a scenario up by name.
pub fn find(name: &str) -> Result<ScenarioSpec, ScenarioError> {
    all()
        .into_iter()
        .find(|s| s.name() == name)
        .ok_or_else(|| ScenarioError::UnknownScenario(name.to_owned()))
}
