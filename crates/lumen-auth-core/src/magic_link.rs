//! Magic-link issuance and redemption
//!
//! A link moves `issued -> redeemed` or `issued -> expired`, both
//! terminal. Single use is contractual: the signed token alone cannot
//! enforce it, so issuance records a pending entry in the store and
//! redemption atomically consumes it. A second redemption finds no
//! entry and fails with the same collapsed outcome as a forged token.

use std::sync::Arc;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use lumen_store::{IdentityDirectory, KvStore, StoreError};
use lumen_types::{normalize_email, AuthProvider, Identity};

use crate::crypto::hash_token;
use crate::error::AuthError;
use crate::token::{TokenClaims, TokenCodec};

/// Server-held consumption record, keyed by token hash
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PendingLink {
    email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    locale: Option<String>,
    expires_at: i64,
}

/// Issues and redeems magic-link tokens
pub struct MagicLinkService<D, S> {
    codec: Arc<TokenCodec>,
    store: Arc<S>,
    directory: Arc<D>,
    ttl: Duration,
}

impl<D: IdentityDirectory, S: KvStore> MagicLinkService<D, S> {
    /// Create the service
    pub fn new(codec: Arc<TokenCodec>, store: Arc<S>, directory: Arc<D>, ttl: Duration) -> Self {
        Self {
            codec,
            store,
            directory,
            ttl,
        }
    }

    /// Mint a single-use login token bound to the normalized email
    pub async fn issue(&self, email: &str, locale: Option<String>) -> Result<String, AuthError> {
        let email = normalize_email(email);
        let exp = (self.codec.clock().now() + self.ttl).timestamp();

        let token = self.codec.mint(&TokenClaims::Magic {
            email: email.clone(),
            locale: locale.clone(),
            exp,
        })?;

        let pending = PendingLink {
            email: email.clone(),
            locale,
            expires_at: exp,
        };
        let value = serde_json::to_string(&pending)
            .map_err(|e| AuthError::Internal(format!("pending link serialization: {e}")))?;
        self.store
            .put(&Self::pending_key(&token), value, Some(self.ttl))
            .await?;

        tracing::info!(email = %email, "magic link issued");
        Ok(token)
    }

    /// Redeem a token exactly once, yielding the identity and the
    /// locale carried through the link.
    ///
    /// Store failure during consumption is a deny, never a success.
    pub async fn redeem(&self, token: &str) -> Result<(Identity, Option<String>), AuthError> {
        // Authenticity and freshness first; only then touch the store
        let claims = self.codec.verify(token)?;
        let TokenClaims::Magic { email, .. } = claims else {
            return Err(AuthError::KindMismatch);
        };

        let Some(raw) = self.store.take(&Self::pending_key(token)).await? else {
            tracing::debug!("magic link has no pending entry, already consumed");
            return Err(AuthError::AlreadyConsumed);
        };
        let pending: PendingLink = serde_json::from_str(&raw).map_err(|_| StoreError::Corrupt {
            key: Self::pending_key(token),
        })?;

        // The pending entry is keyed by the token hash, so a bound-email
        // mismatch means the store was tampered with out of band.
        if pending.email != email {
            return Err(AuthError::InvalidPayload);
        }

        let identity = self
            .directory
            .lookup_or_create(&email, AuthProvider::MagicLink)
            .await?;

        tracing::info!(user_id = %identity.id, "magic link redeemed");
        Ok((identity, pending.locale))
    }

    fn pending_key(token: &str) -> String {
        format!("magic:{}", hash_token(token))
    }
}

impl<D, S> std::fmt::Debug for MagicLinkService<D, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MagicLinkService")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_store::{MemoryIdentityDirectory, MemoryStore};
    use lumen_types::ManualClock;

    fn service() -> (
        MagicLinkService<MemoryIdentityDirectory, MemoryStore>,
        ManualClock,
    ) {
        let clock = ManualClock::from_system();
        let codec = Arc::new(
            TokenCodec::new(
                &["test-secret-test-secret-test-secret!!".to_string()],
                Arc::new(clock.clone()),
            )
            .unwrap(),
        );
        let store = Arc::new(MemoryStore::new(Arc::new(clock.clone())));
        let directory = Arc::new(MemoryIdentityDirectory::new());
        (
            MagicLinkService::new(codec, store, directory, Duration::minutes(15)),
            clock,
        )
    }

    #[tokio::test]
    async fn test_issue_and_redeem() {
        let (service, _) = service();

        let token = service.issue("Alice@Example.com", Some("de".into())).await.unwrap();
        let (identity, locale) = service.redeem(&token).await.unwrap();

        assert_eq!(identity.email, "alice@example.com");
        assert_eq!(identity.origin_provider, AuthProvider::MagicLink);
        assert_eq!(locale.as_deref(), Some("de"));
    }

    #[tokio::test]
    async fn test_second_redemption_fails() {
        let (service, _) = service();

        let token = service.issue("alice@example.com", None).await.unwrap();
        assert!(service.redeem(&token).await.is_ok());

        let second = service.redeem(&token).await;
        assert!(matches!(second, Err(AuthError::AlreadyConsumed)));
    }

    #[tokio::test]
    async fn test_expired_link_rejected() {
        let (service, clock) = service();

        let token = service.issue("alice@example.com", None).await.unwrap();
        clock.advance(Duration::minutes(16));

        assert!(matches!(service.redeem(&token).await, Err(AuthError::Expired)));
    }

    #[tokio::test]
    async fn test_repeat_login_reuses_identity() {
        let (service, _) = service();

        let t1 = service.issue("alice@example.com", None).await.unwrap();
        let (first, _) = service.redeem(&t1).await.unwrap();

        let t2 = service.issue("ALICE@example.com", None).await.unwrap();
        let (second, _) = service.redeem(&t2).await.unwrap();

        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_forged_token_rejected() {
        let (service, _) = service();
        assert!(service.redeem("forged.token").await.is_err());
    }
}
