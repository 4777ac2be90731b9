//! Static token validator for local development and tests.
//!
//! Maps fixed tokens to authenticated sessions. A real deployment replaces
//! this with an adapter for its identity provider; the hub and transport
//! only see the `SessionValidator` port either way.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, AuthenticatedSession};
use crate::ports::SessionValidator;

/// In-memory token -> session map.
#[derive(Debug, Default)]
pub struct StaticSessionValidator {
    sessions: RwLock<HashMap<String, AuthenticatedSession>>,
}

impl StaticSessionValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style registration of a known token.
    pub fn with_session(self, token: impl Into<String>, session: AuthenticatedSession) -> Self {
        self.insert(token, session);
        self
    }

    /// Registers a token after construction.
    pub fn insert(&self, token: impl Into<String>, session: AuthenticatedSession) {
        self.sessions
            .write()
            .expect("StaticSessionValidator: sessions lock poisoned")
            .insert(token.into(), session);
    }

    /// Revokes a token. Idempotent.
    pub fn revoke(&self, token: &str) {
        self.sessions
            .write()
            .expect("StaticSessionValidator: sessions lock poisoned")
            .remove(token);
    }
}

#[async_trait]
impl SessionValidator for StaticSessionValidator {
    async fn validate(&self, token: &str) -> Result<AuthenticatedSession, AuthError> {
        self.sessions
            .read()
            .expect("StaticSessionValidator: sessions lock poisoned")
            .get(token)
            .cloned()
            .ok_or(AuthError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{TenantId, UserId};

    fn session(tenant: &str, user: &str) -> AuthenticatedSession {
        AuthenticatedSession::new(TenantId::new(tenant).unwrap(), UserId::new(user).unwrap())
    }

    #[tokio::test]
    async fn known_token_resolves_session() {
        let validator =
            StaticSessionValidator::new().with_session("tok-1", session("stable-a", "rider-1"));

        let resolved = validator.validate("tok-1").await.unwrap();
        assert_eq!(resolved.tenant.as_str(), "stable-a");
        assert_eq!(resolved.user.as_str(), "rider-1");
    }

    #[tokio::test]
    async fn unknown_token_is_invalid() {
        let validator = StaticSessionValidator::new();
        assert!(matches!(
            validator.validate("nope").await,
            Err(AuthError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn revoked_token_is_invalid() {
        let validator =
            StaticSessionValidator::new().with_session("tok-1", session("stable-a", "rider-1"));
        validator.revoke("tok-1");

        assert!(validator.validate("tok-1").await.is_err());
    }
}
