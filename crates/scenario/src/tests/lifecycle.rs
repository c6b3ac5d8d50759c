use std::collections::BTreeMap;
use std::path::Path;

use vigil_channel::InteractionScript;
use vigil_config::{HarnessConfig, LaunchConfig, PathsConfig, TimingConfig};

use crate::{library, ExpectedOutcome, Phase, Scenario, ScenarioSpec, Verdict, DEFAULT_TOLERANCE};

/// A committed block fixture the stub service publishes.
const BLOCK_FIXTURE: &str = r#"{
    "block_hash": "stub-hash-1",
    "previous_block_hash": "genesis",
    "transactions": [
        {"sender": "0xAA", "receiver": "0xBB", "amount": "20"}
    ],
    "state": {
        "0xAA": {"balance": "80"},
        "0xBB": {"balance": "120"}
    }
}"#;

/// Harness config whose launch template runs shell one-liners: members are
/// long sleeps, and the service/client scripts are supplied per test.
fn stub_config(root: &Path, service_script: &str, client_script: &str) -> HarnessConfig {
    let mut config = HarnessConfig::default();
    config.paths = PathsConfig {
        root: root.to_owned(),
        blocks_dir: "blocks".into(),
        priv_keys_dir: "keys/priv".into(),
        pub_keys_dir: "keys/pub".into(),
    };
    config.launch = LaunchConfig {
        program: "sh".to_owned(),
        args: vec!["-c".to_owned(), "{entry}".to_owned()],
        participant_entry: "sleep 30".to_owned(),
        service_entry: service_script.to_owned(),
        client_entry: client_script.to_owned(),
        service_args: Vec::new(),
    };
    config.timing = TimingConfig {
        participant_start_delay_ms: 0,
        service_startup_delay_ms: 10,
        client_prompt_delay_ms: 100,
        inter_step_delay_ms: 10,
        stabilization_delay_ms: 10,
        settle_delay_ms: 50,
        poll_interval_ms: 25,
        verify_deadline_ms: 3_000,
        grace_timeout_ms: 200,
    };
    config
}

fn expected_stub_balances() -> BTreeMap<String, f64> {
    [("0xAA".to_owned(), 80.0), ("0xBB".to_owned(), 120.0)].into()
}

#[test]
fn test_scenario_passes_when_stub_ledger_commits() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("fixture")).unwrap();
    std::fs::write(dir.path().join("fixture/block1.json"), BLOCK_FIXTURE).unwrap();

    // The service stands in for the external ledger: it commits the block
    // shortly after launch, then stays alive.
    let config = stub_config(
        dir.path(),
        "sleep 0.2; cp fixture/block1.json blocks/block1.json; sleep 30",
        "cat > client-input.txt",
    );
    let spec = ScenarioSpec::new("stub-happy")
        .with_script(InteractionScript::new().transfer("Miguel", "20").exit())
        .expect(ExpectedOutcome::MinBlocks(1))
        .expect(ExpectedOutcome::Balances {
            expected: expected_stub_balances(),
            tolerance: DEFAULT_TOLERANCE,
        });

    let report = Scenario::new(config, spec).run().unwrap();
    assert_eq!(report.verdict, Verdict::Passed, "{report}");
    assert!(report.mismatches.is_empty());
    assert_eq!(report.phase_reached, Phase::Verify);

    // The client received the script, token by token, in order.
    let driven = std::fs::read_to_string(dir.path().join("client-input.txt")).unwrap();
    assert_eq!(driven, "1\nMiguel\n20\n0\n");
}

#[test]
fn test_scenario_fails_on_balance_mismatch_with_diagnostics() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("fixture")).unwrap();
    std::fs::write(dir.path().join("fixture/block1.json"), BLOCK_FIXTURE).unwrap();

    let mut config = stub_config(
        dir.path(),
        "cp fixture/block1.json blocks/block1.json; echo service-log; sleep 30",
        "cat > /dev/null",
    );
    // A wrong expectation polls to the deadline; keep it short.
    config.timing.verify_deadline_ms = 400;

    let spec = ScenarioSpec::new("stub-wrong-balance")
        .with_script(InteractionScript::new().transfer("Miguel", "20").exit())
        .expect(ExpectedOutcome::Balances {
            expected: [("0xAA".to_owned(), 65.0)].into(),
            tolerance: DEFAULT_TOLERANCE,
        });

    let report = Scenario::new(config, spec).run().unwrap();
    assert_eq!(report.verdict, Verdict::Failed);
    assert!(
        report.mismatches.iter().any(|m| m.contains("expected 65.00, got 80.00")),
        "mismatches: {:?}",
        report.mismatches
    );
    // Every check ran to completion: the timeout reason is reported too.
    assert!(report.mismatches.iter().any(|m| m.contains("timed out")));
    // Captured process output is attached to the non-passing report.
    assert!(report
        .process_output
        .iter()
        .any(|(name, out)| name == crate::SERVICE_NAME && out.stdout.contains("service-log")));
}

#[test]
fn test_unexpected_block_fails_negative_assertion() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("fixture")).unwrap();
    std::fs::write(dir.path().join("fixture/block1.json"), BLOCK_FIXTURE).unwrap();

    // The stub commits a block — well after the pre-Drive baseline is
    // taken, well before the post-settle read — even though the scenario
    // expects none.
    let mut config = stub_config(
        dir.path(),
        "sleep 0.5; cp fixture/block1.json blocks/block1.json; sleep 30",
        "cat > /dev/null",
    );
    config.timing.settle_delay_ms = 1_000;
    let spec = ScenarioSpec::new("stub-unexpected-block")
        .with_script(InteractionScript::new().transfer("jiraiya", "10000").exit())
        .expect(ExpectedOutcome::NoNewBlocks);

    let report = Scenario::new(config, spec).run().unwrap();
    assert_eq!(report.verdict, Verdict::Failed);
    assert!(report.mismatches.iter().any(|m| m.contains("unexpected new block 1")));
}

#[test]
fn test_launch_failure_errors_the_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = stub_config(dir.path(), "sleep 30", "cat > /dev/null");
    config.launch.program = "definitely-not-a-real-binary".to_owned();

    let spec = library::invalid_transfer();
    let report = Scenario::new(config, spec).run().unwrap();
    assert_eq!(report.verdict, Verdict::Errored);
    assert_eq!(report.phase_reached, Phase::Launch);
    assert!(report.error.as_deref().is_some_and(|e| e.contains("failed to launch")));
}

#[test]
fn test_broken_channel_is_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    // The client exits immediately, so driving it breaks the channel; the
    // scenario still settles, verifies, and passes its negative assertion.
    let config = stub_config(dir.path(), "sleep 30", "true");

    let spec = ScenarioSpec::new("stub-broken-channel")
        .with_script(InteractionScript::new().transfer("Miguel", "20").exit())
        .expect(ExpectedOutcome::NoNewBlocks);

    let report = Scenario::new(config, spec).run().unwrap();
    assert_eq!(report.verdict, Verdict::Passed, "{report}");
    assert!(
        report.notes.iter().any(|n| n.contains("interaction abandoned")),
        "notes: {:?}",
        report.notes
    );
}

#[test]
fn test_crash_injection_and_quorum_advisory() {
    let dir = tempfile::tempdir().unwrap();
    let config = stub_config(dir.path(), "sleep 30", "cat > /dev/null");

    // Crashing two of four leaves live=2 > f=1, so the advisory disagrees
    // with the author's stated expectation and surfaces as a note.
    let spec = ScenarioSpec::new("stub-crash-two")
        .with_crash(&["member1", "member2"])
        .with_script(InteractionScript::new().exit())
        .expect_quorum(false)
        .expect(ExpectedOutcome::NoNewBlocks);

    let report = Scenario::new(config, spec).run().unwrap();
    assert_eq!(report.verdict, Verdict::Passed, "{report}");
    assert!(report.notes.iter().any(|n| n.contains("advisory")), "notes: {:?}", report.notes);
}
