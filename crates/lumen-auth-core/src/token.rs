//! Signed token codec
//!
//! Tokens are `base64url(json-claims).base64url(hmac-sha256-tag)`.
//! The claims are a tagged union keyed by `kind`, so a payload whose
//! required field for its kind is absent fails to decode even when the
//! signature is valid.

use std::sync::Arc;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::{Deserialize, Serialize};

use lumen_types::{Clock, Identity};

use crate::crypto::{constant_time_eq, HmacKey};
use crate::error::AuthError;

/// Separator between encoded claims and tag
pub const TOKEN_SEPARATOR: char = '.';

/// Token claims, discriminated by `kind`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TokenClaims {
    /// Long-lived session identity
    Session {
        identity: Identity,
        #[serde(skip_serializing_if = "Option::is_none")]
        locale: Option<String>,
        exp: i64,
    },
    /// Short-lived email-ownership proof
    Magic {
        email: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        locale: Option<String>,
        exp: i64,
    },
    /// Anti-CSRF state for the OAuth redirect round trip
    OauthState {
        #[serde(skip_serializing_if = "Option::is_none")]
        locale: Option<String>,
        exp: i64,
    },
}

impl TokenClaims {
    /// Expiry instant, epoch seconds
    pub fn exp(&self) -> i64 {
        match self {
            Self::Session { exp, .. } | Self::Magic { exp, .. } | Self::OauthState { exp, .. } => {
                *exp
            }
        }
    }

    /// Kind discriminant as it appears on the wire
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Session { .. } => "session",
            Self::Magic { .. } => "magic",
            Self::OauthState { .. } => "oauth_state",
        }
    }
}

/// Mints and verifies signed tokens.
///
/// Owns no mutable state; minting always uses the first key, while
/// verification accepts any key in the list (rotation grace window).
pub struct TokenCodec {
    keys: Vec<HmacKey>,
    clock: Arc<dyn Clock>,
}

impl TokenCodec {
    /// Create a codec over the given secrets.
    ///
    /// # Errors
    /// `NotConfigured` when no secret is supplied or any secret is
    /// shorter than 32 bytes.
    pub fn new(secrets: &[String], clock: Arc<dyn Clock>) -> Result<Self, AuthError> {
        if secrets.is_empty() {
            return Err(AuthError::NotConfigured("signing secret"));
        }
        let keys = secrets
            .iter()
            .map(HmacKey::new)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| {
                tracing::error!("rejecting signing secret: {}", e);
                AuthError::NotConfigured("signing secret of at least 32 bytes")
            })?;
        Ok(Self { keys, clock })
    }

    /// Serialize, sign, and encode claims into a token string
    pub fn mint(&self, claims: &TokenClaims) -> Result<String, AuthError> {
        let json = serde_json::to_vec(claims)
            .map_err(|e| AuthError::Internal(format!("claims serialization: {e}")))?;
        let payload_b64 = URL_SAFE_NO_PAD.encode(&json);
        let tag = self.keys[0].sign(payload_b64.as_bytes());
        let tag_b64 = URL_SAFE_NO_PAD.encode(tag);
        Ok(format!("{payload_b64}{TOKEN_SEPARATOR}{tag_b64}"))
    }

    /// Verify a token and recover its claims.
    ///
    /// Authenticity is checked before anything else; an authentic but
    /// expired token fails with `Expired`, which the boundary collapses
    /// into the same generic outcome as every other failure here.
    pub fn verify(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let (payload_b64, tag_b64) = token
            .rsplit_once(TOKEN_SEPARATOR)
            .ok_or(AuthError::InvalidPayload)?;

        let tag = URL_SAFE_NO_PAD
            .decode(tag_b64)
            .map_err(|_| AuthError::InvalidPayload)?;

        let authentic = self.keys.iter().any(|key| {
            let expected = key.sign(payload_b64.as_bytes());
            constant_time_eq(&expected, &tag)
        });
        if !authentic {
            tracing::debug!("token signature mismatch");
            return Err(AuthError::SignatureMismatch);
        }

        let json = URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|_| AuthError::InvalidPayload)?;
        let claims: TokenClaims =
            serde_json::from_slice(&json).map_err(|_| AuthError::InvalidPayload)?;

        if self.clock.now().timestamp() >= claims.exp() {
            return Err(AuthError::Expired);
        }

        Ok(claims)
    }

    /// Clock used for expiry decisions
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("keys", &self.keys.len())
            .finish_non_exhaustive()
    }
}
