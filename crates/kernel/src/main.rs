//! Tessera Site Kernel
//!
//! HTTP server rendering CMS pages through the block pipeline.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::http::StatusCode;
use tower_http::compression::CompressionLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use tessera_kernel::{AppState, Config, routes};

/// Upper bound on handling one request, outbound calls included.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing();

    info!("Starting Tessera site kernel");

    let config = Config::from_env().context("failed to load configuration")?;
    info!(
        port = config.port,
        environment = ?config.environment,
        site = %config.site_name,
        "Configuration loaded"
    );

    let state = AppState::new(&config).context("failed to initialize application state")?;

    info!(
        block_types = state.pipeline().registry().len(),
        "Block registry ready"
    );

    // Middleware layers (last added = first executed in request flow):
    // TraceLayer → compression → timeout → routes
    let app = routes::router()
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            REQUEST_TIMEOUT,
        ))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("failed to bind to address")?;

    info!(%addr, "Server listening");

    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
