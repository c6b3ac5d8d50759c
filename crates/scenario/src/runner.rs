//! The scenario runner.
//!
//! One coordinating thread executes the phases strictly in order; the only
//! true concurrency lives in the external system under test, observed
//! through polling. Every wait is bounded, and teardown runs no matter
//! which phase failed, timed out, or was interrupted.

use std::collections::BTreeSet;
use std::time::Instant;

use tokio::runtime::Builder;
use tracing::{debug, info, warn};
use vigil_channel::{FocusTarget, InputAutomation, InteractionChannel};
use vigil_config::HarnessConfig;
use vigil_injector::FaultInjector;
use vigil_observer::{
    poll_until, verify_append_only, verify_balances, verify_conservation, verify_distribution,
    verify_min_blocks, verify_no_new_blocks, BlockHistory, BlockStore, ObservedBlock, PollOptions,
    VerificationResult,
};
use vigil_supervisor::{ProcessSupervisor, SpawnOptions, SupervisorError};

use crate::{ExpectedOutcome, Phase, ScenarioError, ScenarioReport, ScenarioSpec, Verdict};

/// Logical name of the ledger access service process.
pub const SERVICE_NAME: &str = "ledger-service";

/// One configured, runnable scenario.
pub struct Scenario {
    config: HarnessConfig,
    spec: ScenarioSpec,
    automation: Option<Box<dyn InputAutomation>>,
}

impl Scenario {
    /// Pair a harness configuration with a scenario spec.
    pub fn new(config: HarnessConfig, spec: ScenarioSpec) -> Self {
        Self { config, spec, automation: None }
    }

    /// Drive the client through a host input automation capability instead
    /// of its input stream.
    pub fn with_automation(mut self, automation: Box<dyn InputAutomation>) -> Self {
        self.automation = Some(automation);
        self
    }

    /// Execute the scenario to a verdict.
    ///
    /// Builds a current-thread runtime internally so the state machine runs
    /// strictly sequentially; callers stay synchronous.
    pub fn run(self) -> Result<ScenarioReport, ScenarioError> {
        let runtime =
            Builder::new_current_thread().enable_all().build().map_err(ScenarioError::Runtime)?;
        Ok(runtime.block_on(execute(self.config, self.spec, self.automation)))
    }
}

impl std::fmt::Debug for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scenario").field("spec", &self.spec.name()).finish_non_exhaustive()
    }
}

async fn execute(
    config: HarnessConfig,
    spec: ScenarioSpec,
    automation: Option<Box<dyn InputAutomation>>,
) -> ScenarioReport {
    let started = Instant::now();
    info!(scenario = spec.name(), "starting scenario");

    let injector = FaultInjector::new(&config.cluster.participants);
    let mut cx = Context {
        config,
        spec,
        automation,
        supervisor: ProcessSupervisor::new(),
        injector,
        failures: Vec::new(),
        notes: Vec::new(),
        phase: Phase::Setup,
    };

    let error = cx.run_phases().await.err();

    // Teardown is unconditional: whatever the phases did, every tracked
    // process is terminated and individual failures stay logged-only.
    cx.supervisor.terminate_all(cx.config.timing.grace_timeout()).await;

    let verdict = match (&error, cx.failures.is_empty()) {
        (Some(_), _) => Verdict::Errored,
        (None, false) => Verdict::Failed,
        (None, true) => Verdict::Passed,
    };
    let process_output =
        if verdict.passed() { Vec::new() } else { cx.supervisor.captured_output() };
    info!(scenario = cx.spec.name(), %verdict, "scenario finished");

    ScenarioReport {
        scenario: cx.spec.name().to_owned(),
        verdict,
        phase_reached: cx.phase,
        mismatches: cx.failures,
        notes: cx.notes,
        error,
        process_output,
        duration: started.elapsed(),
    }
}

struct Context {
    config: HarnessConfig,
    spec: ScenarioSpec,
    automation: Option<Box<dyn InputAutomation>>,
    supervisor: ProcessSupervisor,
    injector: FaultInjector,
    failures: Vec<String>,
    notes: Vec<String>,
    phase: Phase,
}

impl Context {
    async fn run_phases(&mut self) -> Result<(), String> {
        self.phase = Phase::Setup;
        self.setup()?;

        self.phase = Phase::Launch;
        self.launch().await.map_err(|e| e.to_string())?;

        self.phase = Phase::Inject;
        self.inject().await;

        // Negative assertions compare against what existed before the
        // script was driven.
        let baseline = self.store().baseline();

        self.phase = Phase::Drive;
        self.drive().await?;

        self.phase = Phase::Settle;
        debug!(delay = ?self.config.timing.settle_delay(), "settling");
        tokio::time::sleep(self.config.timing.settle_delay()).await;

        self.phase = Phase::Verify;
        self.verify(&baseline).await;
        Ok(())
    }

    fn store(&self) -> BlockStore {
        BlockStore::new(self.config.paths.blocks())
    }

    /// Reset the external persisted state: key material and block records.
    fn setup(&mut self) -> Result<(), String> {
        let mut dirs = vec![self.config.paths.blocks()];
        dirs.extend(self.config.paths.key_dirs());
        for dir in dirs {
            if let Err(e) = std::fs::remove_dir_all(&dir) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    return Err(format!("failed to clear {}: {e}", dir.display()));
                }
            }
            std::fs::create_dir_all(&dir)
                .map_err(|e| format!("failed to create {}: {e}", dir.display()))?;
            debug!(dir = %dir.display(), "reset directory");
        }
        Ok(())
    }

    /// Spawn participants (Byzantine tags baked into their arguments), the
    /// ledger access service, and the interactive client — each followed by
    /// a settle delay, since they register with each other asynchronously.
    async fn launch(&mut self) -> Result<(), SupervisorError> {
        for (participant, behavior) in self.spec.byzantine().to_vec() {
            self.injector.declare_byzantine(&participant, &behavior);
        }

        let root = self.config.paths.root.clone();
        let timing = self.config.timing.clone();

        for name in self.config.cluster.participants.clone() {
            let behavior = self.injector.behavior_of(&name).map(str::to_owned);
            let command = self.config.launch.participant(&name, behavior.as_deref());
            self.supervisor.spawn(
                &name,
                &command.program,
                &command.args,
                SpawnOptions::captured().in_dir(root.clone()),
            )?;
            tokio::time::sleep(timing.participant_start_delay()).await;
        }

        let service = self.config.launch.service();
        self.supervisor.spawn(
            SERVICE_NAME,
            &service.program,
            &service.args,
            SpawnOptions::captured().in_dir(root.clone()),
        )?;
        tokio::time::sleep(timing.service_startup_delay()).await;

        let client_name = self.config.cluster.client_name.clone();
        let client = self.config.launch.client(&client_name);
        self.supervisor.spawn(
            &client_name,
            &client.program,
            &client.args,
            SpawnOptions::interactive().in_dir(root),
        )?;
        tokio::time::sleep(timing.client_prompt_delay()).await;
        Ok(())
    }

    /// Apply scripted crash faults, then let the survivors stabilize.
    async fn inject(&mut self) {
        if !self.spec.crash().is_empty() {
            let crash = self.spec.crash().to_vec();
            let crashed = self
                .injector
                .crash(&mut self.supervisor, &crash, self.config.timing.grace_timeout())
                .await;
            info!(requested = crash.len(), crashed, "injected crash faults");
            tokio::time::sleep(self.config.timing.stabilization_delay()).await;
        }

        let quorum = self.injector.has_quorum(self.config.cluster.fault_tolerance);
        info!(quorum, live = self.injector.roster().live_count(), "roster after injection");
        if let Some(expected) = self.spec.quorum_expectation() {
            if expected != quorum {
                self.notes.push(format!(
                    "advisory: scenario expects quorum={expected} but roster says quorum={quorum}"
                ));
            }
        }
    }

    /// Send the interaction script into the client.
    ///
    /// A channel that breaks mid-script abandons the remaining steps but
    /// does not abort the scenario; verification still runs against
    /// whatever the system committed.
    async fn drive(&mut self) -> Result<(), String> {
        let script = self.spec.script().clone();
        if script.is_empty() {
            return Ok(());
        }
        let client_name = self.config.cluster.client_name.clone();

        let mut channel = match self.automation.take() {
            Some(automation) => {
                let pid = self.supervisor.process(&client_name).and_then(|p| p.pid);
                InteractionChannel::simulated(automation, FocusTarget::new(&client_name, pid))
            }
            None => match self.supervisor.take_stdin(&client_name) {
                Some(stdin) => InteractionChannel::direct(stdin),
                None => return Err(format!("client {client_name} has no input stream to drive")),
            },
        };

        if let Err(e) = channel.send(script, self.config.timing.inter_step_delay()).await {
            warn!(error = %e, "interaction channel broke, abandoning remaining steps");
            self.notes.push(format!("interaction abandoned: {e}"));
        }
        Ok(())
    }

    /// Run every declared check; mismatches accumulate and never stop the
    /// remaining checks.
    async fn verify(&mut self, baseline: &BTreeSet<u64>) {
        let store = self.store();
        let opts = PollOptions {
            interval: self.config.timing.poll_interval(),
            deadline: self.config.timing.verify_deadline(),
        };
        let capacity = self.config.cluster.block_capacity;
        let submitted = self.spec.script().transfer_count();
        let mut history = BlockHistory::new();

        for expectation in self.spec.expectations().to_vec() {
            match expectation {
                ExpectedOutcome::Balances { expected, tolerance } => {
                    self.poll_check(&store, opts, &mut history, move |blocks| {
                        verify_balances(blocks, &expected, tolerance)
                    })
                    .await;
                }
                ExpectedOutcome::MinBlocks(min) => {
                    self.poll_check(&store, opts, &mut history, move |blocks| {
                        verify_min_blocks(blocks, min)
                    })
                    .await;
                }
                ExpectedOutcome::Distribution => {
                    self.poll_check(&store, opts, &mut history, move |blocks| {
                        verify_distribution(blocks, capacity, submitted)
                    })
                    .await;
                }
                ExpectedOutcome::NoNewBlocks => {
                    // The settle window already elapsed; anything beyond the
                    // pre-Drive baseline is a failure regardless of content.
                    let current = store.baseline();
                    self.record(verify_no_new_blocks(baseline, &current));
                }
                ExpectedOutcome::Conservation { initial, tolerance } => {
                    let blocks = store.read_all();
                    self.record(verify_conservation(&blocks, &initial, tolerance));
                    self.record(verify_append_only(&mut history, &blocks));
                }
            }
        }
    }

    /// Poll until a check passes or the deadline elapses; on timeout the
    /// check runs once more over the final state so every mismatch is
    /// reported alongside the timeout reason.
    async fn poll_check<F>(
        &mut self,
        store: &BlockStore,
        opts: PollOptions,
        history: &mut BlockHistory,
        check: F,
    ) where
        F: Fn(&[ObservedBlock]) -> VerificationResult,
    {
        let poll_result = {
            let supervisor = &mut self.supervisor;
            let cancel = move || service_failure(supervisor);
            poll_until(store, |blocks| check(blocks).passed(), opts, cancel).await
        };

        match poll_result {
            Ok(blocks) => {
                self.record(check(&blocks));
                self.record(verify_append_only(history, &blocks));
            }
            Err(e) => {
                let blocks = store.read_all();
                self.record(check(&blocks));
                self.record(verify_append_only(history, &blocks));
                self.failures.push(e.to_string());
            }
        }
    }

    fn record(&mut self, result: VerificationResult) {
        for mismatch in result.mismatches {
            self.failures.push(mismatch.to_string());
        }
        self.notes.extend(result.notes);
    }
}

/// Abort reason when the ledger access service died under the poll.
fn service_failure(supervisor: &mut ProcessSupervisor) -> Option<String> {
    if supervisor.process(SERVICE_NAME).is_none() {
        return None;
    }
    if supervisor.is_alive(SERVICE_NAME) {
        return None;
    }
    let exit = supervisor.process(SERVICE_NAME).and_then(|p| p.exit_code);
    Some(format!("{SERVICE_NAME} terminated unexpectedly (exit code {exit:?})"))
}
