use std::sync::Arc;

use clap::Parser;
use periscope::Registry;
use tokio::net::TcpListener;
use tracing::{error, info};

use periscope_server::cli::Cli;
use periscope_server::logging::init_logging;
use periscope_server::ws::{self, AppState};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(err) = run(cli).await {
        error!(target = "periscoped", error = %err, "server failed");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let registry = Arc::new(Registry::new(cli.session_config()));
    let state = AppState {
        registry,
        stream: cli.stream_config(),
    };

    let addr = format!("{}:{}", cli.host, cli.port);
    let listener = TcpListener::bind(&addr).await?;
    info!(target = "periscoped", addr = %addr, "listening for live view connections");

    axum::serve(listener, ws::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!(target = "periscoped", "shutdown requested");
    }
}
