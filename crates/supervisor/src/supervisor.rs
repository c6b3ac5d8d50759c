//! The process supervisor registry.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::{CapturedOutput, ManagedProcess, ProcessState, SupervisorError};

/// How long to wait for output-drain tasks after a child is reaped.
const DRAIN_TIMEOUT: Duration = Duration::from_millis(500);

/// Options for [`ProcessSupervisor::spawn`].
#[derive(Debug, Clone, Default)]
pub struct SpawnOptions {
    /// Working directory for the child; inherits the harness's when `None`.
    pub working_dir: Option<PathBuf>,
    /// Pipe and drain stdout/stderr into in-memory buffers.
    pub capture_output: bool,
    /// Pipe stdin so an interaction channel can write to it.
    pub pipe_stdin: bool,
}

impl SpawnOptions {
    /// Capture stdout/stderr.
    pub fn captured() -> Self {
        Self { capture_output: true, ..Self::default() }
    }

    /// Capture stdout/stderr and pipe stdin.
    pub fn interactive() -> Self {
        Self { capture_output: true, pipe_stdin: true, working_dir: None }
    }

    /// Set the working directory.
    pub fn in_dir(mut self, dir: PathBuf) -> Self {
        self.working_dir = Some(dir);
        self
    }
}

type OutputBuffer = Arc<Mutex<String>>;

struct Tracked {
    record: ManagedProcess,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stdout_buf: Option<OutputBuffer>,
    stderr_buf: Option<OutputBuffer>,
    drains: Vec<JoinHandle<()>>,
}

/// Registry of spawned external processes.
///
/// One supervisor is owned by one scenario run; there is no ambient global
/// process list. Dropping the supervisor kills anything still alive
/// (children are spawned with `kill_on_drop`), but orderly scenarios go
/// through [`terminate_all`](Self::terminate_all) so output is drained and
/// exit codes recorded.
pub struct ProcessSupervisor {
    tracked: BTreeMap<String, Tracked>,
}

impl ProcessSupervisor {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self { tracked: BTreeMap::new() }
    }

    /// Spawn an external process under the given logical name.
    ///
    /// Returns [`SupervisorError::Launch`] when the command cannot be
    /// started (unresolvable executable, bad working directory). On success
    /// the record starts `Starting` and moves to `Running` as soon as the
    /// OS reports a pid.
    pub fn spawn(
        &mut self,
        name: &str,
        program: &str,
        args: &[String],
        opts: SpawnOptions,
    ) -> Result<&ManagedProcess, SupervisorError> {
        let command_line = render_command_line(program, args);
        let mut record = ManagedProcess::new(name, command_line.clone());

        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(if opts.pipe_stdin { Stdio::piped() } else { Stdio::null() })
            .stdout(if opts.capture_output { Stdio::piped() } else { Stdio::null() })
            .stderr(if opts.capture_output { Stdio::piped() } else { Stdio::null() })
            .kill_on_drop(true);
        if let Some(dir) = &opts.working_dir {
            command.current_dir(dir);
        }

        let mut child = command.spawn().map_err(|source| SupervisorError::Launch {
            name: name.to_owned(),
            command: command_line,
            source,
        })?;

        record.pid = child.id();
        if record.pid.is_some() {
            record.state = ProcessState::Running;
        }
        info!(name, pid = ?record.pid, command = %record.command, "spawned process");

        let stdin = child.stdin.take();
        let mut drains = Vec::new();
        let stdout_buf = child.stdout.take().map(|out| {
            let buf: OutputBuffer = Arc::default();
            drains.push(spawn_drain(out, Arc::clone(&buf)));
            buf
        });
        let stderr_buf = child.stderr.take().map(|err| {
            let buf: OutputBuffer = Arc::default();
            drains.push(spawn_drain(err, Arc::clone(&buf)));
            buf
        });

        let tracked = Tracked {
            record,
            child: Some(child),
            stdin,
            stdout_buf,
            stderr_buf,
            drains,
        };
        let entry = match self.tracked.entry(name.to_owned()) {
            Entry::Vacant(vacant) => vacant.insert(tracked),
            Entry::Occupied(mut occupied) => {
                warn!(name, "replacing already-tracked process");
                occupied.insert(tracked);
                occupied.into_mut()
            }
        };
        Ok(&entry.record)
    }

    /// Non-blocking liveness check.
    ///
    /// A process that exited on its own is reaped here and its record moves
    /// to `Terminated` with the exit code attached.
    pub fn is_alive(&mut self, name: &str) -> bool {
        let Some(tracked) = self.tracked.get_mut(name) else {
            return false;
        };
        let Some(child) = tracked.child.as_mut() else {
            return false;
        };
        match child.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                debug!(name, ?status, "process exited on its own");
                tracked.record.exit_code = status.code();
                tracked.record.state = ProcessState::Terminated;
                tracked.child = None;
                false
            }
            Err(e) => {
                warn!(name, error = %e, "liveness check failed");
                false
            }
        }
    }

    /// Look up the record for a logical name.
    pub fn process(&self, name: &str) -> Option<&ManagedProcess> {
        self.tracked.get(name).map(|t| &t.record)
    }

    /// Logical names of every process ever tracked, in name order.
    pub fn names(&self) -> Vec<String> {
        self.tracked.keys().cloned().collect()
    }

    /// Take ownership of the piped stdin of a process, if any remains.
    ///
    /// The caller (an interaction channel) owns the handle from here on;
    /// dropping it closes the stream, which is the client's exit signal.
    pub fn take_stdin(&mut self, name: &str) -> Option<ChildStdin> {
        self.tracked.get_mut(name).and_then(|t| t.stdin.take())
    }

    /// Terminate one process: request shutdown, wait up to `grace`, then
    /// force-kill. Drains and attaches captured output before returning.
    ///
    /// Idempotent: terminating an already-`Terminated` entity is a no-op.
    pub async fn terminate(&mut self, name: &str, grace: Duration) -> Result<(), SupervisorError> {
        let tracked = self
            .tracked
            .get_mut(name)
            .ok_or_else(|| SupervisorError::Unknown(name.to_owned()))?;

        if matches!(tracked.record.state, ProcessState::Terminated | ProcessState::Failed) {
            debug!(name, "terminate on already-terminated process is a no-op");
            return Ok(());
        }

        if let Some(mut child) = tracked.child.take() {
            // Closing stdin is the shutdown request; the reference client
            // exits on end-of-input.
            drop(tracked.stdin.take());

            match timeout(grace, child.wait()).await {
                Ok(Ok(status)) => {
                    debug!(name, ?status, "process exited within grace period");
                    tracked.record.exit_code = status.code();
                }
                Ok(Err(source)) => {
                    tracked.record.state = ProcessState::Failed;
                    attach_output(tracked).await;
                    return Err(SupervisorError::Terminate { name: name.to_owned(), source });
                }
                Err(_) => {
                    debug!(name, "grace period elapsed, killing");
                    if let Err(source) = child.kill().await {
                        tracked.record.state = ProcessState::Failed;
                        attach_output(tracked).await;
                        return Err(SupervisorError::Terminate {
                            name: name.to_owned(),
                            source,
                        });
                    }
                    if let Ok(status) = child.wait().await {
                        tracked.record.exit_code = status.code();
                    }
                }
            }
        }

        tracked.record.state = ProcessState::Terminated;
        attach_output(tracked).await;
        info!(name, exit_code = ?tracked.record.exit_code, "terminated process");
        Ok(())
    }

    /// Terminate every tracked process, best-effort.
    ///
    /// Individual failures are logged and collected into the records, never
    /// propagated; this is the teardown path and must not raise.
    pub async fn terminate_all(&mut self, grace: Duration) {
        let names = self.names();
        for name in names {
            if let Err(e) = self.terminate(&name, grace).await {
                warn!(name, error = %e, "teardown: failed to terminate process");
            }
        }
    }

    /// Captured output of every tracked process that produced any.
    pub fn captured_output(&self) -> Vec<(String, CapturedOutput)> {
        self.tracked
            .iter()
            .filter_map(|(name, t)| {
                t.record.output.as_ref().filter(|o| !o.is_empty()).map(|o| (name.clone(), o.clone()))
            })
            .collect()
    }
}

impl Default for ProcessSupervisor {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ProcessSupervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessSupervisor").field("tracked", &self.names()).finish()
    }
}

fn render_command_line(program: &str, args: &[String]) -> String {
    let mut line = program.to_owned();
    for arg in args {
        line.push(' ');
        line.push_str(arg);
    }
    line
}

fn spawn_drain<R>(mut reader: R, buf: OutputBuffer) -> JoinHandle<()>
where
    R: AsyncReadExt + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut chunk = [0u8; 4096];
        loop {
            match reader.read(&mut chunk).await {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    buf.lock().await.push_str(&String::from_utf8_lossy(&chunk[..n]));
                }
            }
        }
    })
}

async fn attach_output(tracked: &mut Tracked) {
    for drain in tracked.drains.drain(..) {
        if timeout(DRAIN_TIMEOUT, drain).await.is_err() {
            warn!(name = %tracked.record.name, "output drain did not finish in time");
        }
    }
    let stdout = match &tracked.stdout_buf {
        Some(buf) => buf.lock().await.clone(),
        None => String::new(),
    };
    let stderr = match &tracked.stderr_buf {
        Some(buf) => buf.lock().await.clone(),
        None => String::new(),
    };
    if tracked.stdout_buf.is_some() || tracked.stderr_buf.is_some() {
        tracked.record.output = Some(CapturedOutput { stdout, stderr });
    }
}
