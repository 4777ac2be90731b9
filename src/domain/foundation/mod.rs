//! Foundation value objects shared across the realtime layer.

mod auth;
mod errors;
mod events;
mod ids;
mod timestamp;

pub use auth::{AuthError, AuthenticatedSession};
pub use errors::ValidationError;
pub use events::{catalogue, EventEnvelope, EventName, ModuleAction};
pub use ids::{ConnectionId, TenantId, UserId};
pub use timestamp::Timestamp;
