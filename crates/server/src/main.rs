mod cmd;
mod config;
mod error;
mod routes;

use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "server", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Verify the WASI runtime CLI and interpreter module are usable
    Check(cmd::CheckArgs),
    /// Execute one snippet from the command line and print the result
    Exec(cmd::ExecArgs),
    /// Serve the HTTP execution API
    Serve(cmd::ServeArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt().init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Check(args) => cmd::run_check(args).await.map(|()| ExitCode::SUCCESS),
        Command::Exec(args) => cmd::run_exec(args).await,
        Command::Serve(args) => cmd::run_serve(args).await.map(|()| ExitCode::SUCCESS),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
