// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Form Relay Service
//!
//! Accepts form posts from the allow-listed sites and relays them by email.
//!
//! ## Endpoints
//!
//! - `POST /api/submit`: submit a form (JSON or URL-encoded body)
//! - `OPTIONS /api/submit`: CORS preflight
//! - `GET /health`, `GET /healthz`: liveness
//! - `GET /metrics`: Prometheus counters
//!
//! ## Configuration
//!
//! Configuration is loaded from environment variables:
//!
//! - `SMTP_HOST`, `SMTP_PORT` (587), `SMTP_USER`, `SMTP_PASS`: relay
//! - `TO_EMAIL`: internal recipient; `FROM_EMAIL`: auto-reply Reply-To
//! - `ALLOWED_ORIGINS`: comma-separated origin allow-list
//! - `ENFORCE_ORIGIN`: origin check on/off (default: true)
//! - `TEMPLATE_DIR`: template directory (default: emails)
//! - `RATE_LIMIT_POINTS` (5), `RATE_LIMIT_WINDOW_SECS` (60)
//! - `BIND_ADDR`: Server bind address (default: 0.0.0.0:8080)

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use form_relay::{config::Config, handlers::AppState, mailer::SmtpMailer, router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!(
        bind_addr = %config.bind_addr,
        smtp_host = %config.smtp.host,
        smtp_port = config.smtp.port,
        allowed_origins = ?config.validation.allowed_origins,
        enforce_origin = config.validation.enforce_origin,
        rate_limit_points = config.rate_limit.points,
        rate_limit_window_secs = config.rate_limit.window_secs,
        "Starting form relay"
    );

    // Create application state
    let mailer = Arc::new(SmtpMailer::new(&config.smtp)?);
    let state = Arc::new(AppState::new(config.clone(), mailer)?);

    // Spawn cleanup task
    let cleanup_state = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(cleanup_state.config.rate_limit.window_duration());
        loop {
            interval.tick().await;
            cleanup_state.limiter.cleanup().await;
        }
    });

    // Build router
    let app = router(state).layer(TraceLayer::new_for_http());

    // Start server
    let addr: SocketAddr = config.bind_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
