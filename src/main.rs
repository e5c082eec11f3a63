//! Wedding Invitation Backend
//!
//! REST backend for personalized wedding invitations, RSVP collection and
//! the admin dashboard, with SQLite persistence and live update streams.

mod api;
mod auth;
mod config;
mod db;
mod errors;
mod live;
mod models;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use auth::{AdminCredentials, AdminGate};
use config::Config;
use db::Repository;
use live::LiveStore;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub live: Arc<LiveStore>,
    pub gate: Arc<AdminGate>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env();

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Wedding Invitation Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);
    tracing::info!("Public base URL: {}", config.public_base_url);

    if !config.admin_gate_enabled() {
        tracing::warn!(
            "No admin account configured (WEDDING_ADMIN_EMAIL / WEDDING_ADMIN_PASSWORD). Admin routes are open!"
        );
    }

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(Repository::new(pool));

    // Load the initial live snapshots
    let live = Arc::new(LiveStore::new());
    live.prime(&repo).await?;
    tracing::info!("Live store primed");

    let gate = Arc::new(AdminGate::new(
        admin_credentials(&config),
        config.session_ttl_hours,
    ));

    // Create application state
    let state = AppState {
        repo,
        live: live.clone(),
        gate,
        config: Arc::new(config.clone()),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(live))
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Build the admin account from configuration, if one is set.
pub fn admin_credentials(config: &Config) -> Option<AdminCredentials> {
    match (&config.admin_email, &config.admin_password) {
        (Some(email), Some(password)) => Some(AdminCredentials {
            email: email.clone(),
            password: password.clone(),
        }),
        _ => None,
    }
}

/// Wait for Ctrl+C, then close every live stream so connections drain.
async fn shutdown_signal(live: Arc<LiveStore>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutdown requested");
    live.shutdown();
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let gate = state.gate.clone();

    // Public routes
    let public_routes = Router::new()
        .route("/revision", get(api::get_revision))
        .route("/config", get(api::get_public_config))
        .route("/invite/{slug}", get(api::get_invitation))
        .route(
            "/invite/{slug}/responses",
            get(api::list_responses).post(api::submit_response),
        )
        .route(
            "/invite/{slug}/responses/stream",
            get(api::stream_responses),
        )
        // Admin session
        .route("/admin/login", post(api::login))
        .route("/admin/logout", post(api::logout))
        .route("/admin/session", get(api::session_status));

    // Admin routes
    let admin_routes = Router::new()
        .route("/admin/config", get(api::get_config).put(api::put_config))
        .route(
            "/admin/guests",
            get(api::list_guests).post(api::add_guest),
        )
        .route("/admin/guests/stream", get(api::stream_guests))
        .route(
            "/admin/guests/{slug}",
            get(api::get_guest).delete(api::delete_guest),
        )
        .route(
            "/admin/guests/{slug}/toggle-family",
            post(api::toggle_family),
        )
        .route(
            "/admin/guests/{slug}/responses",
            get(api::list_guest_responses),
        )
        .route("/admin/guests/{slug}/share", get(api::share_guest))
        .route("/admin/stats", get(api::get_stats))
        .route("/admin/dashboard", get(api::get_dashboard))
        .route("/admin/dashboard/stream", get(api::stream_dashboard))
        // Apply admin session middleware
        .layer(middleware::from_fn(move |req, next| {
            auth::admin_auth_layer(gate.clone(), req, next)
        }));

    // Health check and landing redirect (no auth required)
    let root_routes = Router::new()
        .route("/health", get(health_check))
        .route("/go", get(api::landing_redirect));

    Router::new()
        .nest("/api", public_routes.merge(admin_routes))
        .merge(root_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests;
