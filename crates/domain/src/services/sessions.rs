//! In-process session and remember-me stores with sliding expirations.
//!
//! Both stores key entries by a SHA3 fingerprint of the opaque cookie token;
//! the plaintext token exists only in the cookie. Sliding behavior comes
//! from the cache's idle clock: every successful resolve restarts it.

use std::time::Duration;

use moka::sync::Cache;
use sha3::{Digest, Sha3_256};

use crate::model::EmailAddress;
use crate::services::auth::generate_token;

/// Idle timeout of an interactive session.
pub const SESSION_IDLE_TTL: Duration = Duration::from_secs(30 * 60);
/// Sliding lifetime of the remember-me credential.
pub const REMEMBER_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Session cookie: HTTP-only, session-scoped, essential.
pub const SESSION_COOKIE: &str = "carmarket_session";
/// Remember-me cookie: HTTP-only, 30-day sliding, secure on production.
pub const AUTH_COOKIE: &str = "carmarket_auth";

const DEFAULT_CAPACITY: u64 = 100_000;

/// Identity attached to an authenticated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub email: EmailAddress,
    pub display_name: String,
    pub is_admin: bool,
}

pub struct SessionService {
    sessions: Cache<String, AuthSession>,
    remember: Cache<String, AuthSession>,
}

impl SessionService {
    pub fn new() -> Self {
        Self::with_ttls(SESSION_IDLE_TTL, REMEMBER_TTL)
    }

    pub fn with_ttls(session_idle: Duration, remember_idle: Duration) -> Self {
        Self {
            sessions: Cache::builder()
                .time_to_idle(session_idle)
                .max_capacity(DEFAULT_CAPACITY)
                .build(),
            remember: Cache::builder()
                .time_to_idle(remember_idle)
                .max_capacity(DEFAULT_CAPACITY)
                .build(),
        }
    }

    /// Opens an interactive session, returning the cookie token.
    pub fn open_session(&self, identity: AuthSession) -> String {
        let token = generate_token();
        self.sessions.insert(fingerprint(&token), identity);
        token
    }

    /// Resolves and touches a session token; `None` when expired or unknown.
    pub fn resolve_session(&self, token: &str) -> Option<AuthSession> {
        self.sessions.get(&fingerprint(token))
    }

    pub fn revoke_session(&self, token: &str) {
        self.sessions.invalidate(&fingerprint(token));
    }

    /// Issues a long-lived remember-me token, returning the cookie value.
    pub fn issue_remember_token(&self, identity: AuthSession) -> String {
        let token = generate_token();
        self.remember.insert(fingerprint(&token), identity);
        token
    }

    /// Resolves and touches a remember-me token.
    pub fn resolve_remember_token(&self, token: &str) -> Option<AuthSession> {
        self.remember.get(&fingerprint(token))
    }

    pub fn revoke_remember_token(&self, token: &str) {
        self.remember.invalidate(&fingerprint(token));
    }
}

impl Default for SessionService {
    fn default() -> Self {
        Self::new()
    }
}

fn fingerprint(token: &str) -> String {
    let mut hasher = Sha3_256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(is_admin: bool) -> AuthSession {
        AuthSession {
            email: EmailAddress::parse("user@example.com").unwrap(),
            display_name: "User".into(),
            is_admin,
        }
    }

    #[test]
    fn session_roundtrip_and_revocation() {
        let service = SessionService::new();
        let token = service.open_session(identity(false));
        assert_eq!(service.resolve_session(&token), Some(identity(false)));

        service.revoke_session(&token);
        assert_eq!(service.resolve_session(&token), None);
    }

    #[test]
    fn unknown_tokens_resolve_to_none() {
        let service = SessionService::new();
        assert_eq!(service.resolve_session("deadbeef"), None);
        assert_eq!(service.resolve_remember_token("deadbeef"), None);
    }

    #[test]
    fn idle_sessions_expire() {
        let service = SessionService::with_ttls(Duration::from_millis(200), REMEMBER_TTL);
        let token = service.open_session(identity(true));

        std::thread::sleep(Duration::from_millis(400));
        assert_eq!(service.resolve_session(&token), None);
    }

    #[test]
    fn access_slides_the_idle_window() {
        let service = SessionService::with_ttls(Duration::from_millis(400), REMEMBER_TTL);
        let token = service.open_session(identity(false));

        for _ in 0..4 {
            std::thread::sleep(Duration::from_millis(150));
            assert!(service.resolve_session(&token).is_some());
        }

        std::thread::sleep(Duration::from_millis(800));
        assert_eq!(service.resolve_session(&token), None);
    }

    #[test]
    fn remember_tokens_are_independent_of_sessions() {
        let service = SessionService::new();
        let remember = service.issue_remember_token(identity(true));
        assert_eq!(service.resolve_session(&remember), None);
        assert_eq!(
            service.resolve_remember_token(&remember),
            Some(identity(true))
        );
    }
}
