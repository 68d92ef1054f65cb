// Wasatah Ledger API - append-only demo ledger over HTTP

use ledger_api::{app, AppState};
use ledger_core::{Config, Ledger};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_level(true)
            .with_line_number(true)
            .init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = Config::from_env()?;
    info!(
        service = %config.service_name,
        version = %config.service_version,
        "Starting ledger API"
    );

    let ledger = Ledger::open(&config).await?;
    info!(events = ledger.len(), "Ledger opened");

    let app = app(
        AppState::new(ledger.clone()),
        &config.server.cors_allowed_origins,
    );

    let listener = tokio::net::TcpListener::bind(&config.server.listen_addr).await?;
    info!("Ledger API listening on: {}", listener.local_addr()?);
    info!("   GET  /api/ledger - List events (newest first)");
    info!("   POST /api/ledger/append - Append an event");
    info!("   POST /api/ledger/reset - Reset to seed data");
    info!("   GET  /health - Health check");
    info!("   GET  /metrics - Prometheus metrics");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    ledger.shutdown().await?;
    info!("Ledger API stopped");

    Ok(())
}
