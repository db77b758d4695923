mod config;
mod errors;
mod handlers;
mod middleware;
mod models;
mod services;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::services::ServeDir;
use crate::{
    config::Config,
    services::{CredentialStore, StatusMonitor},
};
use tracing_subscriber;

#[tokio::main]
async fn main() {
    // Initialize basic tracing subscriber
    tracing_subscriber::fmt::init();

    // Load configuration
    let config = Config::load().expect("Failed to load configuration");
    let config_state = config.clone();

    // Core services: the store serializes all credential-file mutations, the
    // monitor shares its view of the store for the user count
    let store = CredentialStore::new(&config.proxy, &config.command);
    let monitor = StatusMonitor::new(&config.command, store.clone());

    // Create router with all routes; every route sits behind the admin gate
    let app = Router::new()
        // Dashboard
        .route("/", get(handlers::dashboard))

        // User management
        .route("/add_user", post(handlers::add_user))
        .route("/remove_user/:username", post(handlers::remove_user))
        .route("/change_password", post(handlers::change_password))

        // Service control
        .route("/restart_service/:service", post(handlers::restart_service))

        // Machine-readable endpoints
        .route("/api/status", get(handlers::api_status))
        .route("/api/users", get(handlers::api_users))

        // Static files
        .nest_service("/static", ServeDir::new("static"))

        // Add middleware
        .layer(from_fn_with_state(config.admin.clone(), middleware::require_auth))

        // Add state
        .with_state((store, monitor, config_state));

    tracing::info!(
        "Dashboard listening on {}:{}",
        config.server.host,
        config.server.port
    );
    let listener = tokio::net::TcpListener::bind(
        format!("{}:{}", config.server.host, config.server.port)
    )
    .await
    .expect("Failed to bind server");

    axum::serve(listener, app.into_make_service())
        .await
        .expect("Failed to start server");
}
