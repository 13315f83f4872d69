//! OAuth state guard
//!
//! Signed anti-CSRF state carried through the third-party redirect
//! round trip. Unlike a magic link, state is not single-use: the
//! authorization code from the provider is the actual one-time secret.
//! The signature only prevents an attacker-chosen state from being
//! injected into the callback.

use std::sync::Arc;

use chrono::Duration;

use crate::error::AuthError;
use crate::token::{TokenClaims, TokenCodec};

/// Mints and validates OAuth state values
pub struct OauthStateGuard {
    codec: Arc<TokenCodec>,
    ttl: Duration,
}

impl OauthStateGuard {
    /// Create the guard
    pub fn new(codec: Arc<TokenCodec>, ttl: Duration) -> Self {
        Self { codec, ttl }
    }

    /// Mint a short-lived state value carrying only the locale
    pub fn create_state(&self, locale: Option<String>) -> Result<String, AuthError> {
        let exp = (self.codec.clock().now() + self.ttl).timestamp();
        self.codec.mint(&TokenClaims::OauthState { locale, exp })
    }

    /// Validate a returned state and recover the locale
    pub fn consume_state(&self, state: &str) -> Result<Option<String>, AuthError> {
        match self.codec.verify(state)? {
            TokenClaims::OauthState { locale, .. } => Ok(locale),
            _ => Err(AuthError::KindMismatch),
        }
    }
}

impl std::fmt::Debug for OauthStateGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OauthStateGuard")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
