use std::io::Read;
use std::path::{Path, PathBuf};

use sandbox::SandboxError;

use crate::config::WasiRuntimeConfig;

/// WebAssembly module header magic (`\0asm`).
const WASM_MAGIC: [u8; 4] = [0x00, 0x61, 0x73, 0x6d];

/// Verify that the runtime CLI and the interpreter module are usable.
///
/// Returns the resolved absolute path of the runtime executable. Collects
/// all failures and reports them in a single `BackendNotAvailable` error so
/// an operator sees everything wrong with the deployment at once.
pub(crate) fn check_prerequisites(config: &WasiRuntimeConfig) -> sandbox::Result<PathBuf> {
    let mut errors = Vec::new();

    let runtime = resolve_runtime(&config.runtime, &mut errors);
    if let Some(path) = &runtime {
        check_executable(path, &mut errors);
    }
    check_module(&config.module_path, &mut errors);

    match runtime {
        Some(path) if errors.is_empty() => Ok(path),
        _ => Err(SandboxError::BackendNotAvailable(errors.join("; "))),
    }
}

/// Resolve the runtime CLI: an explicit path is taken as-is, a bare name is
/// looked up on `$PATH`.
fn resolve_runtime(runtime: &str, errors: &mut Vec<String>) -> Option<PathBuf> {
    if runtime.is_empty() {
        errors.push("runtime executable not configured".to_string());
        return None;
    }

    let candidate = Path::new(runtime);
    if candidate.components().count() > 1 {
        if candidate.is_file() {
            return Some(candidate.to_path_buf());
        }
        errors.push(format!("runtime binary not found: {runtime}"));
        return None;
    }

    match which::which(runtime) {
        Ok(path) => Some(path),
        Err(_) => {
            errors.push(format!("runtime executable not found on PATH: {runtime}"));
            None
        }
    }
}

fn check_executable(path: &Path, errors: &mut Vec<String>) {
    use std::os::unix::fs::PermissionsExt;
    if let Ok(meta) = path.metadata()
        && meta.permissions().mode() & 0o111 == 0
    {
        errors.push(format!("runtime binary is not executable: {}", path.display()));
    }
}

/// The module must be a regular file starting with the wasm magic. Catches
/// the common misconfiguration of pointing the module path at the runtime
/// binary or at a directory.
fn check_module(path: &Path, errors: &mut Vec<String>) {
    if path.as_os_str().is_empty() {
        errors.push("interpreter module path not configured".to_string());
        return;
    }
    if !path.is_file() {
        errors.push(format!("interpreter module not found: {}", path.display()));
        return;
    }

    let mut magic = [0u8; 4];
    match std::fs::File::open(path).and_then(|mut f| f.read_exact(&mut magic)) {
        Ok(()) if magic == WASM_MAGIC => {}
        Ok(()) => errors.push(format!(
            "not a WebAssembly module (bad magic): {}",
            path.display()
        )),
        Err(e) => errors.push(format!("unable to read module {}: {e}", path.display())),
    }
}
