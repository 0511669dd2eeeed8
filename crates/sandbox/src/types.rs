use std::time::Duration;

/// One snippet to run.
///
/// `timeout` has already been clamped by the boundary layer to a positive
/// value at or below the configured ceiling; the sandbox trusts it.
#[derive(Debug, Clone)]
pub struct ExecRequest {
    /// Program text, handed to the interpreter as-is (empty included).
    pub code: String,
    /// Text piped to the child's stdin. `None` closes the stream immediately.
    pub stdin: Option<String>,
    /// Wall-clock budget for the whole run.
    pub timeout: Duration,
}

/// Outcome of one sandboxed run.
///
/// `stdout` and `stderr` are each capped at the configured per-stream byte
/// limit; surplus output was discarded while draining, never buffered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecResult {
    pub stdout: String,
    pub stderr: String,
    /// Exit status of the child. `None` when the watchdog killed it; a child
    /// terminated by some other signal reports the negated signal number.
    pub exit_code: Option<i32>,
    /// `true` iff the child was killed for exceeding the request timeout.
    pub timed_out: bool,
    /// Wall-clock time from spawn to termination (or to the kill).
    pub duration_ms: u64,
}
