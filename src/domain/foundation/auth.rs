//! Authenticated session identity and authentication errors.
//!
//! The hub never performs authentication itself; it consumes the decision of
//! the `SessionValidator` port before admitting a connection.

use thiserror::Error;

use super::{TenantId, UserId};

/// Identity attached to a validated session.
///
/// Produced by a `SessionValidator` implementation after a positive
/// authorization decision; the tenant is the fan-out scope for every event
/// delivered to the connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedSession {
    /// Tenant the session belongs to (the fan-out boundary).
    pub tenant: TenantId,

    /// The authenticated user behind the session.
    pub user: UserId,
}

impl AuthenticatedSession {
    /// Creates a new authenticated session.
    pub fn new(tenant: TenantId, user: UserId) -> Self {
        Self { tenant, user }
    }
}

/// Authentication errors that can occur during session validation.
///
/// Domain-centric: they describe what went wrong from the hub's perspective,
/// not the auth provider's.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// The token is missing, malformed, or has an invalid signature.
    #[error("Invalid or expired token")]
    InvalidToken,

    /// The token has expired (separate from InvalidToken for specific handling).
    #[error("Token expired")]
    TokenExpired,

    /// The authentication service is unavailable (network, config, etc.).
    #[error("Auth service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AuthError {
    /// Creates a service unavailable error with a message.
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable(message.into())
    }
}
