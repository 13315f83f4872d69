//! Auth service - ties the token codec, magic links, OAuth state,
//! sessions, rate limiting, and entitlements together

use std::sync::Arc;

use chrono::{DateTime, Utc};

use lumen_store::{IdentityDirectory, KvStore};
use lumen_types::{AuthProvider, Clock, EntitlementRecord, Identity, Plan, Platform, UserId};

use crate::{
    config::AuthConfig,
    entitlement::{EntitlementChange, EntitlementRegistry},
    magic_link::MagicLinkService,
    oauth_state::OauthStateGuard,
    rate_limit::{RateLimitKey, SlidingWindowLimiter},
    session::SessionManager,
    token::TokenCodec,
    AuthError,
};

/// Action labels for the rate buckets guarding token minting
const MAGIC_LINK_ACTION: &str = "magic_link";
const OAUTH_START_ACTION: &str = "oauth_start";

/// Authentication service
///
/// One facade over the whole subsystem, generic over the identity
/// directory and the registry store so tests inject in-memory backings
/// and production wires durable ones.
pub struct AuthService<D, S> {
    config: AuthConfig,
    magic_link: MagicLinkService<D, S>,
    oauth_state: OauthStateGuard,
    sessions: SessionManager,
    rate_limiter: SlidingWindowLimiter,
    entitlements: EntitlementRegistry<S>,
    directory: Arc<D>,
}

impl<D: IdentityDirectory, S: KvStore> AuthService<D, S> {
    /// Create the service.
    ///
    /// # Errors
    /// `NotConfigured` when the config's secrets fail validation; in
    /// production this is a startup failure, never a per-request one.
    pub fn new(
        config: AuthConfig,
        directory: Arc<D>,
        store: Arc<S>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AuthError> {
        let codec = Arc::new(TokenCodec::new(&config.secrets, Arc::clone(&clock))?);

        Ok(Self {
            magic_link: MagicLinkService::new(
                Arc::clone(&codec),
                Arc::clone(&store),
                Arc::clone(&directory),
                config.magic_link_ttl,
            ),
            oauth_state: OauthStateGuard::new(Arc::clone(&codec), config.oauth_state_ttl),
            sessions: SessionManager::new(Arc::clone(&codec), config.session_ttl),
            rate_limiter: SlidingWindowLimiter::new(Arc::clone(&clock)),
            entitlements: EntitlementRegistry::new(store, clock),
            directory,
            config,
        })
    }

    // =========================================================================
    // Magic-link flow
    // =========================================================================

    /// Mint a magic-link token for an email, throttled per client.
    ///
    /// `client_key` is the caller's rate-limit key (peer IP).
    pub async fn request_magic_link(
        &self,
        email: &str,
        locale: Option<String>,
        client_key: &str,
    ) -> Result<String, AuthError> {
        self.check_mint_rate(MAGIC_LINK_ACTION, client_key)?;
        self.magic_link.issue(email, locale).await
    }

    /// Redeem a magic link exactly once and mint a session for the
    /// identity it proves. Returns the identity and the session token.
    pub async fn redeem_magic_link(&self, token: &str) -> Result<(Identity, String), AuthError> {
        let (identity, locale) = self.magic_link.redeem(token).await?;
        let session = self.sessions.mint(&identity, locale)?;
        Ok((identity, session))
    }

    // =========================================================================
    // OAuth flow
    // =========================================================================

    /// Mint the anti-CSRF state for an authorization redirect,
    /// throttled per client like every other minting endpoint
    pub fn begin_oauth(
        &self,
        locale: Option<String>,
        client_key: &str,
    ) -> Result<String, AuthError> {
        self.check_mint_rate(OAUTH_START_ACTION, client_key)?;
        self.oauth_state.create_state(locale)
    }

    /// Validate a returned state value, recovering the locale
    pub fn consume_oauth_state(&self, state: &str) -> Result<Option<String>, AuthError> {
        self.oauth_state.consume_state(state)
    }

    /// Complete an OAuth login for a provider-verified email and mint
    /// a session. The code exchange itself happens at the transport
    /// layer; by the time this runs the email is trusted.
    pub async fn oauth_login(
        &self,
        email: &str,
        locale: Option<String>,
    ) -> Result<(Identity, String), AuthError> {
        let email = lumen_types::normalize_email(email);
        let identity = self
            .directory
            .lookup_or_create(&email, AuthProvider::Google)
            .await?;
        let session = self.sessions.mint(&identity, locale)?;
        tracing::info!(user_id = %identity.id, "oauth login");
        Ok((identity, session))
    }

    // =========================================================================
    // Sessions
    // =========================================================================

    /// Resolve a presented session token to an identity
    pub fn resolve_session(&self, token: &str) -> Result<Identity, AuthError> {
        self.sessions.resolve(token)
    }

    /// Session lifetime in whole seconds (cookie Max-Age)
    pub fn session_ttl_seconds(&self) -> i64 {
        self.sessions.ttl_seconds()
    }

    /// Whether cookies should carry the Secure attribute
    pub fn secure_cookies(&self) -> bool {
        self.config.secure_cookies()
    }

    // =========================================================================
    // Entitlements
    // =========================================================================

    /// Fetch a user's entitlement, creating the free/active default on
    /// first query. Default creation lives here, not in the registry,
    /// so every record has an explicit creating flow.
    pub async fn entitlement_or_default(
        &self,
        user_id: UserId,
    ) -> Result<EntitlementRecord, AuthError> {
        match self.entitlements.get(user_id).await? {
            Some(record) => Ok(record),
            None => self.entitlements.upsert(user_id, EntitlementChange::default()).await,
        }
    }

    /// Record a verified purchase
    pub async fn record_purchase(
        &self,
        user_id: UserId,
        plan: Plan,
        platform: Platform,
        product_id: &str,
        renew_at: DateTime<Utc>,
    ) -> Result<EntitlementRecord, AuthError> {
        self.entitlements
            .upsert(
                user_id,
                EntitlementChange::purchase(plan, platform, product_id, renew_at),
            )
            .await
    }

    // =========================================================================
    // Maintenance
    // =========================================================================

    /// Drop rate buckets with no recent activity; run periodically
    pub fn sweep_rate_buckets(&self) {
        self.rate_limiter.sweep(self.config.mint_rate_window);
    }

    /// Shared admission check for the token-minting endpoints
    fn check_mint_rate(&self, action: &str, client_key: &str) -> Result<(), AuthError> {
        let admitted = self.rate_limiter.admit(
            RateLimitKey::new(action, client_key),
            self.config.mint_rate_limit,
            self.config.mint_rate_window,
        );
        if !admitted {
            tracing::debug!(action = %action, client = %client_key, "request rate limited");
            return Err(AuthError::RateLimited);
        }
        Ok(())
    }
}

impl<D, S> std::fmt::Debug for AuthService<D, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
