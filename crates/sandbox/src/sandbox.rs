use async_trait::async_trait;

use crate::error::Result;
use crate::types::{ExecRequest, ExecResult};

/// Runs one untrusted snippet to completion or timeout, under resource
/// limits, with bounded captured output.
///
/// Implementations hold no mutable state across calls: concurrent `execute`
/// calls are independent, and each spawns exactly one child process that is
/// reaped before the result is returned.
#[async_trait]
pub trait Sandbox: Send + Sync {
    /// Short name of the backing runtime (e.g. "wasi").
    fn name(&self) -> &str;

    /// Run `request.code` to completion or timeout.
    ///
    /// Only configuration and infrastructure failures return `Err`. Bad user
    /// code, non-zero exits, timeouts, and truncated output are all normal
    /// `ExecResult`s.
    async fn execute(&self, request: &ExecRequest) -> Result<ExecResult>;
}
