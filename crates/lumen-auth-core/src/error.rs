//! Auth errors

use thiserror::Error;

/// Authentication errors
///
/// The first five variants must never be distinguished to a caller
/// outside this crate; `is_unauthenticated` marks the set the HTTP
/// boundary collapses into one generic failure.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Token is malformed or its payload cannot be decoded
    #[error("invalid token payload")]
    InvalidPayload,

    /// Integrity tag does not match
    #[error("signature mismatch")]
    SignatureMismatch,

    /// Token is authentic but past its expiry
    #[error("token expired")]
    Expired,

    /// Authentic token of the wrong kind for this operation
    #[error("token kind mismatch")]
    KindMismatch,

    /// Magic link was already redeemed
    #[error("link already consumed")]
    AlreadyConsumed,

    /// Too many requests from this client
    #[error("rate limit exceeded")]
    RateLimited,

    /// Required secret or credential missing; fatal at startup in
    /// production
    #[error("missing required configuration: {0}")]
    NotConfigured(&'static str),

    /// Backing store failed or timed out
    #[error("store error: {0}")]
    Store(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Whether this error collapses to the generic
    /// unauthenticated/invalid outcome at the boundary
    pub fn is_unauthenticated(&self) -> bool {
        matches!(
            self,
            Self::InvalidPayload
                | Self::SignatureMismatch
                | Self::Expired
                | Self::KindMismatch
                | Self::AlreadyConsumed
        )
    }

    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            _ if self.is_unauthenticated() => 401,
            Self::RateLimited => 429,
            Self::NotConfigured(_) | Self::Store(_) | Self::Internal(_) => 500,
            _ => 500,
        }
    }
}

impl From<lumen_store::StoreError> for AuthError {
    fn from(err: lumen_store::StoreError) -> Self {
        tracing::error!("store error: {}", err);
        Self::Store(err.to_string())
    }
}
