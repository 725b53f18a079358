//! eLibrary Server - book rental REST API

use std::net::SocketAddr;

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use elibrary_server::{api, config::LoggingConfig, repository, AppConfig, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let _log_guard = init_tracing(&config.logging);

    tracing::info!("Starting eLibrary Server v{}", env!("CARGO_PKG_VERSION"));

    let repository = repository::connect(&config.database)
        .await
        .context("Failed to open storage")?;

    let addr = SocketAddr::new(
        config.server.host.parse().context("Invalid host address")?,
        config.server.port,
    );

    let app = api::router(AppState::new(config, repository));

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Install the global subscriber; logs go through a non-blocking stdout writer
/// that flushes when the returned guard is dropped
fn init_tracing(logging: &LoggingConfig) -> WorkerGuard {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("elibrary_server={},tower_http=debug", logging.level).into()
    });

    let (writer, guard) = tracing_appender::non_blocking(std::io::stdout());
    let registry = tracing_subscriber::registry().with(filter);

    if logging.format == "json" {
        registry.with(fmt::layer().json().with_writer(writer)).init();
    } else {
        registry.with(fmt::layer().with_writer(writer)).init();
    }

    guard
}
