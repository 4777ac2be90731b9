//! Paddock Realtime service binary.
//!
//! Boots the broadcast hub and SSE endpoints. In non-production
//! environments a static development token is registered so local clients
//! can connect without an identity provider.

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::{routing::get, Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use paddock_realtime::adapters::auth::StaticSessionValidator;
use paddock_realtime::adapters::hub::BroadcastHub;
use paddock_realtime::adapters::sse::{realtime_router, RealtimeState};
use paddock_realtime::config::AppConfig;
use paddock_realtime::domain::foundation::{AuthenticatedSession, TenantId, UserId};

/// Development token honored outside production.
const DEV_TOKEN: &str = "dev-token";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.server.log_level.clone())),
        )
        .init();

    let hub = Arc::new(BroadcastHub::new(config.hub.queue_capacity));
    let validator = Arc::new(StaticSessionValidator::new());

    if !config.is_production() {
        validator.insert(
            DEV_TOKEN,
            AuthenticatedSession::new(TenantId::new("dev-stable")?, UserId::new("dev-user")?),
        );
        info!(token = DEV_TOKEN, "Registered development session token");
    }

    spawn_idle_reaper(Arc::clone(&hub), &config);

    let state = RealtimeState::new(Arc::clone(&hub), validator, config.hub.keep_alive());
    let app = Router::new()
        .route("/health", get(health))
        .nest("/api", realtime_router())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config));

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Paddock realtime service listening");
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .server
        .cors_origins_list()
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "Ignoring unparseable CORS origin");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        CorsLayer::permissive()
    } else {
        CorsLayer::new().allow_origin(origins)
    }
}

fn spawn_idle_reaper(hub: Arc<BroadcastHub>, config: &AppConfig) {
    let idle_timeout = config.hub.idle_timeout();
    let sweep = config.hub.idle_sweep();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(sweep);
        // First tick fires immediately; skip it so a fresh boot never sweeps.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            hub.reap_idle(idle_timeout);
        }
    });
}
