mod config;
mod error;
mod fixes;
mod fixtures;
mod generation;
mod handoff;
mod lead;
mod log_capture;
mod progress;
mod report;
mod results;
mod routes;
mod scan;
mod screen;
mod server;
mod setup;
mod state;
mod store_url;

use clap::Parser;
use std::sync::Arc;
use tracing::info;

use config::{CliArgs, ScannerConfig};
use log_capture::{LogLevel, LogSource};
use state::{spawn_session_sweeper, ScannerState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "klaviyo_health_scanner=info,tower_http=info".into()),
        )
        .init();

    let args = CliArgs::parse();
    info!("Starting klaviyo-health-scanner v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Scan tick: {}ms, report tick: {}ms, max increment: {}",
        args.tick_interval_ms, args.report_tick_interval_ms, args.max_increment
    );

    let config = ScannerConfig::from_args(args);
    let addr = config.listen_addr();

    let state = Arc::new(ScannerState::new(config));

    state
        .logs
        .emit(
            LogSource::Server,
            LogLevel::Info,
            format!("Scanner starting on {}", addr),
        )
        .await;

    if spawn_session_sweeper(state.clone()).is_none() {
        info!("Session expiry disabled");
    }

    let router = server::build_router(state.clone());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Scanner listening on http://{}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(state.clone()))
        .await?;

    info!("Scanner shutting down");

    // Stop any runs still ticking
    let sessions: Vec<_> = state.sessions.read().await.keys().cloned().collect();
    for id in sessions {
        let _ = state.remove_session(&id).await;
    }

    Ok(())
}

async fn shutdown_signal(state: Arc<ScannerState>) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    let mut shutdown_rx = state.shutdown_tx.subscribe();

    tokio::select! {
        _ = ctrl_c => info!("Received shutdown signal"),
        _ = shutdown_rx.recv() => info!("Shutdown requested"),
    }

    state
        .logs
        .emit(LogSource::Server, LogLevel::Info, "Shutdown signal received")
        .await;
}
