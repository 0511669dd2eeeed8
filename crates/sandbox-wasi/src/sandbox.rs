use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Instant;

use async_trait::async_trait;
use sandbox::{ExecRequest, ExecResult, Sandbox, SandboxError};
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::command::build_args;
use crate::config::WasiRuntimeConfig;
use crate::limits;
use crate::output::drain_capped;
use crate::prerequisites::check_prerequisites;

/// Execution sandbox backed by an external WASI runtime CLI.
///
/// Holds only immutable configuration; one instance serves any number of
/// concurrent `execute` calls without locking.
#[derive(Debug)]
pub struct WasiSandbox {
    config: WasiRuntimeConfig,
    /// Absolute path of the runtime CLI, resolved by the prerequisite check.
    runtime: PathBuf,
}

impl WasiSandbox {
    /// Validate prerequisites and construct the sandbox.
    ///
    /// Fails with `BackendNotAvailable` when the runtime CLI or the
    /// interpreter module is missing or malformed, so a misconfigured
    /// deployment is caught at startup rather than on the first request.
    pub fn new(config: WasiRuntimeConfig) -> sandbox::Result<Self> {
        let runtime = check_prerequisites(&config)?;
        Ok(Self { config, runtime })
    }

    /// The resolved runtime CLI path.
    pub fn runtime_path(&self) -> &Path {
        &self.runtime
    }

    fn spawn(&self, code: &str, workdir: &Path) -> sandbox::Result<Child> {
        let mut cmd = Command::new(&self.runtime);
        cmd.args(build_args(&self.config, code))
            .current_dir(workdir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Own process group so the watchdog kill takes the whole tree.
            .process_group(0)
            .kill_on_drop(true);

        let limits = self.config.limits.clone();
        // SAFETY: the hook only calls async-signal-safe syscalls (setrlimit).
        unsafe {
            cmd.pre_exec(move || limits::apply(&limits));
        }

        cmd.spawn().map_err(|e| {
            SandboxError::LaunchFailed(format!("spawn {}: {e}", self.runtime.display()))
        })
    }
}

#[async_trait]
impl Sandbox for WasiSandbox {
    fn name(&self) -> &str {
        "wasi"
    }

    async fn execute(&self, request: &ExecRequest) -> sandbox::Result<ExecResult> {
        let exec_id = Uuid::new_v4();
        let timeout_ms = request.timeout.as_millis() as u64;

        // Scratch working directory for the runtime process itself (the
        // guest sees no filesystem either way). Removed on drop.
        let workdir = tempfile::tempdir().map_err(SandboxError::Io)?;

        debug!(id = %exec_id, timeout_ms, "spawning interpreter");
        let mut child = self.spawn(&request.code, workdir.path())?;
        let started = Instant::now();
        let pid = child.id();

        // Feed stdin from its own task, then close it so the child sees EOF.
        let stdin_writer = match (request.stdin.as_ref(), child.stdin.take()) {
            (Some(input), Some(mut pipe)) => {
                let bytes = input.clone().into_bytes();
                Some(tokio::spawn(async move {
                    // EPIPE just means the child exited without reading.
                    let _ = pipe.write_all(&bytes).await;
                    let _ = pipe.shutdown().await;
                }))
            }
            // No input: drop the pipe so the child reads EOF immediately.
            _ => None,
        };

        // Drain both streams concurrently with the child so it can never
        // block on a full pipe, no matter how much it writes.
        let cap = self.config.limits.max_output_bytes;
        let stdout_pipe = child
            .stdout
            .take()
            .ok_or_else(|| SandboxError::LaunchFailed("stdout pipe unavailable".into()))?;
        let stderr_pipe = child
            .stderr
            .take()
            .ok_or_else(|| SandboxError::LaunchFailed("stderr pipe unavailable".into()))?;
        let stdout_task = tokio::spawn(drain_capped(stdout_pipe, cap));
        let stderr_task = tokio::spawn(drain_capped(stderr_pipe, cap));

        // Race child exit against the watchdog timer.
        let waited = tokio::time::timeout(request.timeout, child.wait()).await;
        let (status, timed_out) = match waited {
            Ok(status) => (Some(status?), false),
            Err(_) => {
                kill_group(pid);
                if let Err(e) = child.kill().await {
                    warn!(id = %exec_id, error = %e, "kill after timeout failed");
                }
                let _ = child.wait().await;
                (None, true)
            }
        };
        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        // Sweep the group even after a normal exit: a straggler forked by
        // the guest could otherwise hold the output pipes open forever.
        if !timed_out {
            kill_group(pid);
        }

        if let Some(writer) = stdin_writer {
            let _ = writer.await;
        }
        let (stdout_bytes, stdout_truncated) = join_drain(stdout_task).await;
        let (stderr_bytes, stderr_truncated) = join_drain(stderr_task).await;

        let exit_code = status.map(exit_code_of);
        info!(
            id = %exec_id,
            exit_code = ?exit_code,
            timed_out,
            duration_ms,
            stdout_truncated,
            stderr_truncated,
            "execution finished"
        );

        Ok(ExecResult {
            stdout: into_text(stdout_bytes),
            stderr: into_text(stderr_bytes),
            exit_code,
            timed_out,
            duration_ms,
        })
    }
}

/// SIGKILL the child's whole process group. The child was spawned with
/// `process_group(0)`, so its pgid equals its pid; the guest cannot ignore
/// or delay the signal. No-op once the group is gone.
fn kill_group(pid: Option<u32>) {
    if let Some(pid) = pid
        && let Ok(pid) = i32::try_from(pid)
    {
        let pgid = nix::unistd::Pid::from_raw(pid);
        let _ = nix::sys::signal::killpg(pgid, nix::sys::signal::Signal::SIGKILL);
    }
}

async fn join_drain(task: JoinHandle<(Vec<u8>, bool)>) -> (Vec<u8>, bool) {
    task.await.unwrap_or_else(|_| (Vec::new(), false))
}

/// Normal exits report their code; a signal death (e.g. the kernel's
/// `RLIMIT_CPU` kill) reports the negated signal number so callers can tell
/// it apart from any interpreter exit code.
fn exit_code_of(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    match status.code() {
        Some(code) => code,
        None => status.signal().map_or(-1, |s| -s),
    }
}

fn into_text(bytes: Vec<u8>) -> String {
    String::from_utf8_lossy(&bytes).into_owned()
}
