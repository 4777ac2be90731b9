//! Session validation port - the authentication boundary for the stream.
//!
//! A connection is registered with the hub only after this port returns a
//! positive decision; unauthenticated requests are rejected before
//! registration, never admitted and filtered later. Implementations are
//! provider-agnostic: a static token map exists for tests and local
//! development, and a real deployment plugs in its identity provider here.

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, AuthenticatedSession};

/// Validates access tokens and resolves the session's tenant scope.
///
/// # Contract
///
/// - `Ok(AuthenticatedSession)` - token valid; the returned tenant is the
///   fan-out scope for the connection
/// - `Err(AuthError::InvalidToken)` - token malformed or signature invalid
/// - `Err(AuthError::TokenExpired)` - token valid but expired
/// - `Err(AuthError::ServiceUnavailable)` - provider unreachable
#[async_trait]
pub trait SessionValidator: Send + Sync {
    /// Validates a raw token (without any "Bearer " prefix).
    async fn validate(&self, token: &str) -> Result<AuthenticatedSession, AuthError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Compile-time check that the trait is object-safe
    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn SessionValidator) {}
}
