//! Configuration types for the auth core

use chrono::Duration;

use crate::error::AuthError;

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

/// Built-in secret usable only outside production
const DEV_SECRET: &str = "lumen-dev-secret-do-not-use-in-prod!";

/// Auth core configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Deployment environment
    pub environment: Environment,
    /// Signing secrets; minting uses the first, verification accepts
    /// all (rotation grace window)
    pub secrets: Vec<String>,
    /// Magic-link token lifetime
    pub magic_link_ttl: Duration,
    /// OAuth state token lifetime
    pub oauth_state_ttl: Duration,
    /// Session token lifetime
    pub session_ttl: Duration,
    /// Max token-minting requests (magic link, OAuth start) per
    /// client within the window
    pub mint_rate_limit: u32,
    /// Rate-limit window
    pub mint_rate_window: Duration,
}

impl AuthConfig {
    /// Build a config, enforcing the startup secret invariant.
    ///
    /// Production fails closed when no explicit secret is supplied;
    /// development falls back to a built-in secret.
    ///
    /// # Errors
    /// `NotConfigured` for a production deployment with no secret.
    pub fn new(environment: Environment, secrets: Vec<String>) -> Result<Self, AuthError> {
        let secrets = if secrets.is_empty() {
            match environment {
                Environment::Production => {
                    return Err(AuthError::NotConfigured("signing secret"));
                }
                Environment::Development => {
                    tracing::warn!("no signing secret configured, using development default");
                    vec![DEV_SECRET.to_string()]
                }
            }
        } else {
            secrets
        };

        Ok(Self {
            environment,
            secrets,
            magic_link_ttl: Duration::minutes(15),
            oauth_state_ttl: Duration::minutes(10),
            session_ttl: Duration::days(30),
            mint_rate_limit: 5,
            mint_rate_window: Duration::seconds(60),
        })
    }

    /// Set the session lifetime
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// Set the magic-link lifetime
    pub fn with_magic_link_ttl(mut self, ttl: Duration) -> Self {
        self.magic_link_ttl = ttl;
        self
    }

    /// Set the token-minting rate limit
    pub fn with_rate_limit(mut self, limit: u32, window: Duration) -> Self {
        self.mint_rate_limit = limit;
        self.mint_rate_window = window;
        self
    }

    /// Whether cookies should carry the `Secure` attribute
    pub fn secure_cookies(&self) -> bool {
        self.environment == Environment::Production
    }
}
