//! Lumen Auth API
//!
//! Authentication microservice: magic-link login, Google OAuth,
//! stateless sessions, and entitlements.

use std::net::SocketAddr;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod extractors;
mod handlers;
mod mailer;
mod oauth;
mod state;

use config::Config;
use state::AppState;

/// How often idle rate-limit buckets are swept
const SWEEP_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    tracing::info!("Starting Lumen Auth API");

    let config = Config::from_env()?;
    let http_port = config.http_port;
    let oauth_configured = config.google.is_some();
    let state = AppState::new(config)?;

    // Background sweep of idle rate-limit buckets and expired
    // pending-link entries
    let auth = state.auth.clone();
    let store = state.store.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            auth.sweep_rate_buckets();
            let purged = store.purge_expired();
            if purged > 0 {
                tracing::debug!(purged, "expired store entries purged");
            }
        }
    });

    let app = router(state, oauth_configured);

    let addr = SocketAddr::from(([0, 0, 0, 0], http_port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Build the router; OAuth routes are mounted only when the provider
/// is configured.
fn router(state: AppState, oauth_configured: bool) -> Router {
    let mut api = Router::new()
        .route("/auth/magic-link", post(handlers::request_magic_link))
        .route("/auth/magic-link/verify", post(handlers::verify_magic_link))
        .route("/auth/me", get(handlers::me))
        .route("/auth/logout", post(handlers::logout))
        .route("/entitlement", get(handlers::get_entitlement));

    if oauth_configured {
        api = api
            .route("/auth/oauth/google", get(handlers::oauth_start))
            .route(
                "/auth/oauth/google/callback",
                get(handlers::oauth_callback),
            );
    }

    Router::new()
        .route("/health", get(handlers::health))
        .route("/ready", get(handlers::ready))
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
