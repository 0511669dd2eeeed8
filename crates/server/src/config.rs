use std::path::{Path, PathBuf};

use sandbox::ResourceLimits;
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

pub(crate) const DEFAULT_MAX_EXEC_TIMEOUT_MS: u64 = 5_000;
pub(crate) const DEFAULT_TIMEOUT_MS: u64 = 2_000;
pub(crate) const DEFAULT_MAX_OUTPUT_BYTES: usize = 1_000_000;
pub(crate) const DEFAULT_CPU_TIME_SECS: u64 = 2;
pub(crate) const DEFAULT_MEMORY_MB: u64 = 256;

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub runtime: RuntimeConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub listen: ListenConfig,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// WASI runtime CLI: an absolute path or a `$PATH` name.
    #[serde(default = "default_executable")]
    pub executable: String,
    /// Interpreter module (e.g. `python.wasm`). Relative paths resolve
    /// against the config file's directory.
    pub module: PathBuf,
    /// Extra runtime arguments, inserted before the module path.
    #[serde(default)]
    pub extra_args: Vec<String>,
    /// Pass the interpreter's isolated-mode flag.
    #[serde(default)]
    pub isolated_mode: bool,
}

fn default_executable() -> String {
    sandbox_wasi::DEFAULT_RUNTIME.to_string()
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Ceiling for per-request `timeout_ms`.
    pub max_exec_timeout_ms: u64,
    /// Timeout substituted when a request omits `timeout_ms`.
    pub default_timeout_ms: u64,
    /// Per-stream cap on captured output.
    pub max_output_bytes: usize,
    pub cpu_time_secs: u64,
    pub memory_mb: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_exec_timeout_ms: DEFAULT_MAX_EXEC_TIMEOUT_MS,
            default_timeout_ms: DEFAULT_TIMEOUT_MS,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
            cpu_time_secs: DEFAULT_CPU_TIME_SECS,
            memory_mb: DEFAULT_MEMORY_MB,
        }
    }
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListenConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

/// Load and validate a server config from a YAML file.
///
/// A relative module path is resolved against the config file's parent
/// directory. Whether the module actually exists is the sandbox
/// prerequisite check's concern, not the parser's.
pub async fn load(path: &Path) -> ServerResult<ServerConfig> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ServerError::Config(format!("read {}: {e}", path.display())))?;
    let mut config: ServerConfig = serde_yaml_ng::from_str(&content)
        .map_err(|e| ServerError::Config(format!("parse {}: {e}", path.display())))?;
    if let Some(config_dir) = path.parent() {
        config.resolve_relative_paths(config_dir);
    }
    validate(&config)?;
    Ok(config)
}

fn validate(config: &ServerConfig) -> ServerResult<()> {
    let limits = &config.limits;
    if limits.max_exec_timeout_ms == 0 {
        return Err(ServerError::Config(
            "limits.max_exec_timeout_ms must be positive".to_string(),
        ));
    }
    if limits.default_timeout_ms == 0 || limits.default_timeout_ms > limits.max_exec_timeout_ms {
        return Err(ServerError::Config(format!(
            "limits.default_timeout_ms must be in [1, {}]",
            limits.max_exec_timeout_ms
        )));
    }
    if limits.max_output_bytes == 0 {
        return Err(ServerError::Config(
            "limits.max_output_bytes must be positive".to_string(),
        ));
    }
    if config.runtime.module.as_os_str().is_empty() {
        return Err(ServerError::Config(
            "runtime.module must be set".to_string(),
        ));
    }
    Ok(())
}

impl ServerConfig {
    fn resolve_relative_paths(&mut self, config_dir: &Path) {
        if self.runtime.module.is_relative() {
            self.runtime.module = config_dir.join(&self.runtime.module);
        }
    }

    /// Build the sandbox backend configuration from this server config.
    pub fn runtime_config(&self) -> sandbox_wasi::WasiRuntimeConfig {
        sandbox_wasi::WasiRuntimeConfig {
            runtime: self.runtime.executable.clone(),
            module_path: self.runtime.module.clone(),
            extra_args: self.runtime.extra_args.clone(),
            isolated_mode: self.runtime.isolated_mode,
            limits: ResourceLimits {
                cpu_time_secs: self.limits.cpu_time_secs,
                memory_mb: self.limits.memory_mb,
                max_output_bytes: self.limits.max_output_bytes,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn write_config(dir: &Path, yaml: &str) -> PathBuf {
        let path = dir.join("server.yaml");
        tokio::fs::write(&path, yaml).await.unwrap();
        path
    }

    #[tokio::test]
    async fn load_full_config() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = r#"
runtime:
  executable: /opt/bin/wasmtime
  module: /opt/python.wasm
  extra_args: ["--wasm", "max-memory=268435456"]
  isolated_mode: true
limits:
  max_exec_timeout_ms: 10000
  default_timeout_ms: 1000
  max_output_bytes: 65536
  cpu_time_secs: 4
  memory_mb: 512
listen:
  host: 0.0.0.0
  port: 9000
"#;
        let path = write_config(dir.path(), yaml).await;

        let config = load(&path).await.unwrap();
        assert_eq!(config.runtime.executable, "/opt/bin/wasmtime");
        assert_eq!(config.runtime.module, PathBuf::from("/opt/python.wasm"));
        assert!(config.runtime.isolated_mode);
        assert_eq!(config.limits.max_exec_timeout_ms, 10_000);
        assert_eq!(config.limits.max_output_bytes, 65_536);
        assert_eq!(config.listen.host, "0.0.0.0");
        assert_eq!(config.listen.port, 9000);
    }

    #[tokio::test]
    async fn load_applies_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "runtime:\n  module: /opt/python.wasm\n").await;

        let config = load(&path).await.unwrap();
        assert_eq!(config.runtime.executable, sandbox_wasi::DEFAULT_RUNTIME);
        assert!(config.runtime.extra_args.is_empty());
        assert!(!config.runtime.isolated_mode);
        assert_eq!(config.limits, LimitsConfig::default());
        assert_eq!(config.listen, ListenConfig::default());
    }

    #[tokio::test]
    async fn load_resolves_module_relative_to_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "runtime:\n  module: artifacts/python.wasm\n").await;

        let config = load(&path).await.unwrap();
        assert_eq!(config.runtime.module, dir.path().join("artifacts/python.wasm"));
    }

    #[tokio::test]
    async fn load_rejects_missing_module_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "runtime:\n  executable: wasmtime\n").await;

        let err = load(&path).await.unwrap_err();
        assert!(err.to_string().contains("module"), "got: {err}");
    }

    #[tokio::test]
    async fn load_rejects_default_timeout_above_ceiling() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = r#"
runtime:
  module: /opt/python.wasm
limits:
  max_exec_timeout_ms: 1000
  default_timeout_ms: 2000
"#;
        let path = write_config(dir.path(), yaml).await;

        let err = load(&path).await.unwrap_err();
        assert!(err.to_string().contains("default_timeout_ms"), "got: {err}");
    }

    #[tokio::test]
    async fn load_rejects_zero_output_cap() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = r#"
runtime:
  module: /opt/python.wasm
limits:
  max_output_bytes: 0
"#;
        let path = write_config(dir.path(), yaml).await;

        let err = load(&path).await.unwrap_err();
        assert!(err.to_string().contains("max_output_bytes"), "got: {err}");
    }

    #[test]
    fn runtime_config_carries_limits_through() {
        let config = ServerConfig {
            runtime: RuntimeConfig {
                executable: "wasmtime".to_string(),
                module: PathBuf::from("/opt/python.wasm"),
                extra_args: vec!["--flag".to_string()],
                isolated_mode: true,
            },
            limits: LimitsConfig {
                cpu_time_secs: 7,
                memory_mb: 64,
                max_output_bytes: 123,
                ..LimitsConfig::default()
            },
            listen: ListenConfig::default(),
        };

        let runtime = config.runtime_config();
        assert_eq!(runtime.limits.cpu_time_secs, 7);
        assert_eq!(runtime.limits.memory_mb, 64);
        assert_eq!(runtime.limits.max_output_bytes, 123);
        assert!(runtime.isolated_mode);
        assert_eq!(runtime.extra_args, vec!["--flag".to_string()]);
    }
}
