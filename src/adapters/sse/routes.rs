//! SSE endpoint for live event delivery.
//!
//! Handles the full connection lifecycle:
//! 1. Extract the access token (Authorization header or `?token=` query)
//! 2. Validate the session - rejection happens before any registration
//! 3. Register a subscriber with the hub
//! 4. Send the `connected` handshake event, then stream queued events
//! 5. Unregister when the client goes away (stream drop)
//!
//! Browsers' native `EventSource` cannot set request headers, which is why
//! the token is also accepted as a query parameter.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Json, Router,
};
use futures::stream::{self, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::adapters::hub::BroadcastHub;
use crate::domain::foundation::{AuthError, ConnectionId, EventEnvelope, EventName};
use crate::ports::SessionValidator;

/// Text sent in keep-alive comment frames.
const KEEP_ALIVE_TEXT: &str = "keep-alive";

/// State required by the realtime endpoints.
#[derive(Clone)]
pub struct RealtimeState {
    /// Shared broadcast hub.
    pub hub: Arc<BroadcastHub>,

    /// Session validation boundary.
    pub validator: Arc<dyn SessionValidator>,

    /// Interval between keep-alive comment frames.
    pub keep_alive: Duration,
}

impl RealtimeState {
    /// Creates the endpoint state.
    pub fn new(
        hub: Arc<BroadcastHub>,
        validator: Arc<dyn SessionValidator>,
        keep_alive: Duration,
    ) -> Self {
        Self {
            hub,
            validator,
            keep_alive,
        }
    }
}

#[derive(Debug, Deserialize)]
struct StreamQuery {
    token: Option<String>,
}

/// Snapshot of hub occupancy, served for monitoring.
#[derive(Debug, Serialize)]
pub struct HubStatus {
    pub total_subscribers: usize,
    pub active_tenants: Vec<String>,
}

/// Unregisters the subscriber when the stream is dropped.
///
/// Dropping the SSE response body is the only reliable client-gone signal,
/// so cleanup rides on `Drop` rather than an explicit close path.
struct ConnectionGuard {
    hub: Arc<BroadcastHub>,
    connection_id: ConnectionId,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.hub.unregister(&self.connection_id);
    }
}

/// Handle SSE stream requests.
///
/// Route: `GET /realtime/events`
///
/// Unauthenticated requests are rejected with 401 before any subscriber is
/// registered; a validator outage maps to 503.
async fn sse_handler(
    State(state): State<RealtimeState>,
    Query(query): Query<StreamQuery>,
    headers: HeaderMap,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, StatusCode> {
    let token = bearer_token(&headers)
        .map(str::to_string)
        .or(query.token)
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let session = state.validator.validate(&token).await.map_err(|e| match e {
        AuthError::InvalidToken | AuthError::TokenExpired => StatusCode::UNAUTHORIZED,
        AuthError::ServiceUnavailable(reason) => {
            tracing::error!(%reason, "Session validator unavailable");
            StatusCode::SERVICE_UNAVAILABLE
        }
    })?;

    let subscriber = state.hub.register(session.tenant, session.user);
    let guard = ConnectionGuard {
        hub: Arc::clone(&state.hub),
        connection_id: subscriber.id(),
    };

    let handshake = EventEnvelope::new(
        EventName::connected(),
        json!({ "connection_id": subscriber.id().to_string() }),
    );

    let stream = stream::once(async move { envelope_frame(&handshake) }).chain(stream::unfold(
        (subscriber, guard),
        |(subscriber, guard)| async move {
            let event = subscriber.next_event().await?;
            Some((envelope_frame(&event), (subscriber, guard)))
        },
    ));

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(state.keep_alive)
            .text(KEEP_ALIVE_TEXT),
    ))
}

/// Handle hub status requests.
///
/// Route: `GET /realtime/status`
async fn status_handler(State(state): State<RealtimeState>) -> Json<HubStatus> {
    let active_tenants = state
        .hub
        .active_tenants()
        .iter()
        .map(|t| t.as_str().to_string())
        .collect();

    Json(HubStatus {
        total_subscribers: state.hub.total_subscriber_count(),
        active_tenants,
    })
}

/// Builds one SSE frame from an envelope.
///
/// The SSE `event` field carries the event name so clients can listen by
/// name; the `data` field carries the full envelope JSON, so the payload
/// timestamp survives transport.
fn envelope_frame(envelope: &EventEnvelope) -> Result<Event, Infallible> {
    let event = Event::default().event(envelope.event_type.as_str());
    match serde_json::to_string(envelope) {
        Ok(data) => Ok(event.data(data)),
        // Value-based payloads serialize infallibly; keep the stream alive
        // regardless.
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize outbound envelope");
            Ok(event.data("{}"))
        }
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Create axum router for the realtime endpoints.
///
/// # Example
///
/// ```ignore
/// let app = Router::new()
///     .nest("/api", realtime_router())
///     .with_state(realtime_state);
/// ```
pub fn realtime_router() -> Router<RealtimeState> {
    Router::new()
        .route("/realtime/events", get(sse_handler))
        .route("/realtime/status", get(status_handler))
}
