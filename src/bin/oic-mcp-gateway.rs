use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio::signal;
use tokio::sync::Notify;
use tracing::{info, warn};

use oic_mcp_gateway::config::TenantRegistry;
use oic_mcp_gateway::{build_router, GatewayState};

/// Shutdown drain deadline (spec.md §4.1 "recommended 5 seconds").
const SHUTDOWN_DRAIN: Duration = Duration::from_secs(5);

#[derive(Parser)]
#[command(name = "oic-mcp-gateway")]
#[command(about = "MCP gateway over Oracle Integration Cloud monitoring REST APIs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the gateway, serving both MCP transports over HTTP
    Serve {
        /// Listen port; falls back to the PORT environment variable, then 3000
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Print the tool catalog and exit
    Tools,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Serve { port } => serve_command(port).await,
        Commands::Tools => tools_command(),
    }
}

async fn serve_command(port: Option<u16>) -> Result<()> {
    let tenants = TenantRegistry::from_env();
    let configured = tenants.configured_count();
    if configured == 0 {
        anyhow::bail!("no tenant is configured; set OIC_CLIENT_ID_<TENANT> etc. for at least one tenant");
    }
    info!(configured_tenants = configured, "tenant configuration loaded");

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(120))
        .build()?;
    let state = GatewayState::new(tenants, http);

    // Fresh start: drop any tokens left over from a previous process (spec.md
    // §4.4 "startup/shutdown hygiene").
    state.dispatcher.shutdown().await;

    let port = port
        .or_else(|| std::env::var("PORT").ok().and_then(|p| p.parse().ok()))
        .unwrap_or(3000);
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, tools = state.dispatcher.tool_count(), "oic-mcp-gateway listening");

    let app = build_router(state.clone());

    // The signal that tells axum to stop accepting new connections and the
    // deadline that bounds how long we then wait for in-flight ones are two
    // different things: `with_graceful_shutdown` only covers the former, so
    // the drain itself has to be raced against `SHUTDOWN_DRAIN` out here.
    let stop_accepting = Arc::new(Notify::new());
    let stop_accepting_inner = stop_accepting.clone();
    let serve_task = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { stop_accepting_inner.notified().await })
            .await
    });

    shutdown_signal().await;
    stop_accepting.notify_one();

    info!(deadline = ?SHUTDOWN_DRAIN, "draining outstanding requests before exit");
    match tokio::time::timeout(SHUTDOWN_DRAIN, serve_task).await {
        Ok(Ok(Ok(()))) => {}
        Ok(Ok(Err(err))) => return Err(err.into()),
        Ok(Err(join_err)) => return Err(join_err.into()),
        Err(_) => {
            warn!("shutdown drain deadline exceeded; terminating outstanding work");
            state.dispatcher.shutdown().await;
            std::process::exit(1);
        }
    }

    state.dispatcher.shutdown().await;
    Ok(())
}

fn tools_command() -> Result<()> {
    let dispatcher = {
        let tenants = TenantRegistry::from_env();
        let http = reqwest::Client::new();
        GatewayState::new(tenants, http).dispatcher
    };
    println!("{} tools registered", dispatcher.tool_count());
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received, no longer accepting new connections");
}
