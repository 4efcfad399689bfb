//! Calendar chatbot
//!
//! Authenticates a user with Google and walks them through creating
//! calendars and events over a small chat protocol.

mod api;
mod backend;
mod config;
mod dialogue;
mod session;

use api::{create_router, AppState};
use backend::{GoogleCalendarBackend, GoogleIdentityBroker};
use config::AppConfig;
use session::{InMemorySessionStore, SessionController};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "calendar_chatbot=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let config = AppConfig::from_env()?;
    tracing::info!(
        redirect_url = %config.oauth.redirect_url,
        backend_timeout_secs = config.backend_timeout.as_secs(),
        session_ttl_secs = config.session_ttl.map(|ttl| ttl.as_secs()),
        "Configuration loaded"
    );

    // Collaborators
    let identity = Arc::new(GoogleIdentityBroker::new(
        config.oauth.clone(),
        config.backend_timeout,
    )?);
    let calendar = Arc::new(GoogleCalendarBackend::new(
        &config.calendar_base_url,
        config.backend_timeout,
    )?);
    let controller = Arc::new(SessionController::new(
        Arc::new(InMemorySessionStore::new()),
        identity,
        calendar,
    ));

    if let Some(ttl) = config.session_ttl {
        controller.spawn_expiry_sweep(ttl, config.sweep_interval);
    } else {
        tracing::warn!("Session expiry disabled; sessions live until restart");
    }

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(AppState::new(controller))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Chatbot server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
