//! Session management
//!
//! Sessions are stateless: the signed token is the record. Resolution
//! is pure verification and scales across instances with no shared
//! state. The trade-off is that logout cannot invalidate the token
//! itself; it can only clear the client's cookie, and a previously
//! minted token stays valid until its embedded expiry.

use std::sync::Arc;

use chrono::Duration;

use lumen_types::Identity;

use crate::error::AuthError;
use crate::token::{TokenClaims, TokenCodec};

/// Cookie name carrying the session token
pub const SESSION_COOKIE: &str = "lumen_session";

/// Mints and resolves session tokens
pub struct SessionManager {
    codec: Arc<TokenCodec>,
    ttl: Duration,
}

impl SessionManager {
    /// Create the manager
    pub fn new(codec: Arc<TokenCodec>, ttl: Duration) -> Self {
        Self { codec, ttl }
    }

    /// Mint a long-lived session token for an authenticated identity
    pub fn mint(&self, identity: &Identity, locale: Option<String>) -> Result<String, AuthError> {
        let exp = (self.codec.clock().now() + self.ttl).timestamp();
        self.codec.mint(&TokenClaims::Session {
            identity: identity.clone(),
            locale,
            exp,
        })
    }

    /// Resolve a presented token back to its identity.
    ///
    /// Every failure mode (bad signature, expired, wrong kind,
    /// malformed) must collapse to one unauthenticated outcome at the
    /// boundary; callers get the precise variant only for logging.
    pub fn resolve(&self, token: &str) -> Result<Identity, AuthError> {
        match self.codec.verify(token)? {
            TokenClaims::Session { identity, .. } => Ok(identity),
            _ => Err(AuthError::KindMismatch),
        }
    }

    /// Session lifetime in whole seconds (cookie Max-Age)
    pub fn ttl_seconds(&self) -> i64 {
        self.ttl.num_seconds()
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

/// Build the Set-Cookie value carrying a session token.
///
/// HttpOnly keeps scripts away from the token, SameSite=Lax stops
/// cross-site sends while still allowing the OAuth top-level redirect,
/// and Secure is on in production.
pub fn session_cookie(token: &str, max_age_secs: i64, secure: bool) -> String {
    let secure_attr = if secure { "; Secure" } else { "" };
    format!(
        "{SESSION_COOKIE}={token}; HttpOnly; SameSite=Lax; Path=/; Max-Age={max_age_secs}{secure_attr}"
    )
}

/// Build the Set-Cookie value that logs a client out.
///
/// Overwrites the cookie with an immediately-expired empty value
/// rather than relying on the client to discard it.
pub fn clear_session_cookie(secure: bool) -> String {
    let secure_attr = if secure { "; Secure" } else { "" };
    format!("{SESSION_COOKIE}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0{secure_attr}")
}
