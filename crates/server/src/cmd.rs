use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use actix_web::{App, HttpServer, web};
use clap::Args;
use sandbox::{ExecRequest, Sandbox};
use sandbox_wasi::WasiSandbox;
use tracing::info;

use crate::config;
use crate::error::{ServerError, ServerResult};
use crate::routes::{self, AppState};

#[derive(Args)]
pub struct CheckArgs {
    /// Path to the server config file
    #[arg(long, short, env = "EXEC_SERVER_CONFIG")]
    config: PathBuf,
}

/// Load the config and run the runtime prerequisite checks.
pub async fn run_check(args: CheckArgs) -> ServerResult<()> {
    let config = config::load(&args.config).await?;
    let sandbox = WasiSandbox::new(config.runtime_config())?;
    info!(
        runtime = %sandbox.runtime_path().display(),
        module = %config.runtime.module.display(),
        "runtime prerequisites satisfied"
    );
    Ok(())
}

#[derive(Args)]
pub struct ExecArgs {
    /// Path to the server config file
    #[arg(long, short, env = "EXEC_SERVER_CONFIG")]
    config: PathBuf,
    /// Program text to execute
    #[arg(long, conflicts_with = "file")]
    code: Option<String>,
    /// Read the program text from a file instead
    file: Option<PathBuf>,
    /// Text piped to the program's stdin
    #[arg(long)]
    stdin: Option<String>,
    /// Timeout in milliseconds (defaults to the configured default, capped
    /// at the configured ceiling)
    #[arg(long)]
    timeout_ms: Option<u64>,
}

/// Execute one snippet from the command line and print the captured output.
/// The process exit code mirrors the child's where representable.
pub async fn run_exec(args: ExecArgs) -> ServerResult<ExitCode> {
    let config = config::load(&args.config).await?;

    let code = match (args.code, args.file) {
        (Some(code), None) => code,
        (None, Some(path)) => tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| ServerError::Config(format!("read {}: {e}", path.display())))?,
        _ => {
            return Err(ServerError::Config(
                "provide exactly one of --code or a file argument".to_string(),
            ));
        }
    };

    let timeout_ms = args
        .timeout_ms
        .unwrap_or(config.limits.default_timeout_ms)
        .clamp(1, config.limits.max_exec_timeout_ms);

    let sandbox = WasiSandbox::new(config.runtime_config())?;
    let result = sandbox
        .execute(&ExecRequest {
            code,
            stdin: args.stdin,
            timeout: Duration::from_millis(timeout_ms),
        })
        .await?;

    print!("{}", result.stdout);
    eprint!("{}", result.stderr);

    if result.timed_out {
        eprintln!("timed out after {} ms", result.duration_ms);
        return Ok(ExitCode::FAILURE);
    }
    Ok(match result.exit_code {
        Some(code) => u8::try_from(code).map_or(ExitCode::FAILURE, ExitCode::from),
        None => ExitCode::FAILURE,
    })
}

#[derive(Args)]
pub struct ServeArgs {
    /// Path to the server config file
    #[arg(long, short, env = "EXEC_SERVER_CONFIG")]
    config: PathBuf,
    /// Listen host (overrides config)
    #[arg(long, env = "HOST")]
    host: Option<String>,
    /// Listen port (overrides config)
    #[arg(long, env = "PORT")]
    port: Option<u16>,
}

/// Serve the HTTP execution API until interrupted.
pub async fn run_serve(args: ServeArgs) -> ServerResult<()> {
    let config = config::load(&args.config).await?;
    let host = args.host.unwrap_or_else(|| config.listen.host.clone());
    let port = args.port.unwrap_or(config.listen.port);

    // One sandbox for the process lifetime; it is stateless across requests,
    // so every worker shares it.
    let sandbox = WasiSandbox::new(config.runtime_config())?;
    info!(
        backend = sandbox.name(),
        runtime = %sandbox.runtime_path().display(),
        module = %config.runtime.module.display(),
        "sandbox ready"
    );

    let state = web::Data::new(AppState {
        sandbox: Arc::new(sandbox) as Arc<dyn Sandbox>,
        max_timeout_ms: config.limits.max_exec_timeout_ms,
        default_timeout_ms: config.limits.default_timeout_ms,
    });

    info!(host = %host, port, "listening");
    HttpServer::new(move || App::new().app_data(state.clone()).configure(routes::configure))
        .bind((host.as_str(), port))?
        .run()
        .await?;
    Ok(())
}
