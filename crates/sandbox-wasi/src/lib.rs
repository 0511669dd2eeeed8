mod command;
mod config;
mod limits;
mod output;
mod prerequisites;
mod sandbox;

pub use config::{DEFAULT_RUNTIME, WasiRuntimeConfig};
pub use sandbox::WasiSandbox;
