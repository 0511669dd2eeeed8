use std::path::PathBuf;

use sandbox::ResourceLimits;

/// Conventional runtime CLI name, resolved via `$PATH` when no explicit
/// path is configured.
pub const DEFAULT_RUNTIME: &str = "wasmtime";

/// Static configuration for the WASI interpreter backend.
///
/// Built once at startup from server configuration and never mutated; the
/// sandbox only reads it, so concurrent executions need no locking.
#[derive(Debug, Clone)]
pub struct WasiRuntimeConfig {
    /// Runtime CLI executable: an absolute path, or a bare name looked up
    /// on `$PATH`.
    pub runtime: String,
    /// Path to the interpreter module (e.g. `python.wasm`). The module must
    /// be self-contained; no host directory is ever preopened for it.
    pub module_path: PathBuf,
    /// Extra runtime arguments, inserted between the `run` subcommand and
    /// the module path.
    pub extra_args: Vec<String>,
    /// Pass the interpreter's isolated-mode flag (`-I`). Disable for
    /// interpreter builds that do not support it.
    pub isolated_mode: bool,
    /// Best-effort limits for the child process.
    pub limits: ResourceLimits,
}
