//! Transit Panel - São Paulo traffic and transit aggregation service
//!
//! Serves the live panel, a transit API passthrough and the poll vote
//! counter over HTTP.

use std::process::ExitCode;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use transit_panel::cli::{Cli, Config};
use transit_panel::server::{self, AppState};

/// Sets up log output, defaulting to `info` when `RUST_LOG` is unset
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let config = match Config::from_cli(Cli::parse()) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    info!("Initializing state...");
    let state = AppState::from_config(&config).await;

    info!("Binding to {}", config.bind);
    let listener = match TcpListener::bind(config.bind).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", config.bind, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = server::serve(listener, state).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
