mod bootstrap;
mod health;
mod http;

use anyhow::Result;
use chowline_core::config::{AppConfig, LoadOptions};
use tracing::info;

fn init_logging(config: &AppConfig) {
    use chowline_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Load config and initialize logging before any other operations.
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;

    let address = format!("{}:{}", app.config.server.bind_address, app.config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!(
        event_name = "system.server.listening",
        bind_address = %address,
        "dialog endpoint started"
    );

    let router =
        http::router(app.dispatcher.clone()).merge(health::router(app.db_pool.clone()));
    tokio::spawn(async move {
        if let Err(error) = axum::serve(listener, router).await {
            tracing::error!(
                event_name = "system.server.error",
                error = %error,
                "http server terminated unexpectedly"
            );
        }
    });

    let worker = app.worker.clone();
    tokio::spawn(async move { worker.run().await });
    info!(
        event_name = "system.worker.started",
        poll_interval_secs = app.config.worker.poll_interval_secs,
        "recommendation worker polling the handoff queue"
    );

    wait_for_shutdown().await?;
    info!(event_name = "system.server.stopping", "chowline-server stopping");

    Ok(())
}

async fn wait_for_shutdown() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}
