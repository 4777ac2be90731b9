//! Server-Sent Events transport for the broadcast hub.

mod routes;

pub use routes::{realtime_router, HubStatus, RealtimeState};
