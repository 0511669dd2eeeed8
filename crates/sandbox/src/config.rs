/// Best-effort limits applied to the interpreter process before it runs.
///
/// These are defense-in-depth on top of the runtime's own isolation, not a
/// security boundary. A platform that rejects a given limit runs without it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLimits {
    /// CPU time ceiling in seconds (`RLIMIT_CPU`).
    pub cpu_time_secs: u64,
    /// Address-space ceiling in megabytes (`RLIMIT_AS`).
    pub memory_mb: u64,
    /// Per-stream cap on captured output, in bytes.
    pub max_output_bytes: usize,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            cpu_time_secs: 2,
            memory_mb: 256,
            max_output_bytes: 1_000_000,
        }
    }
}
