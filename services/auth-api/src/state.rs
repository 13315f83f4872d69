//! Application state

use std::sync::Arc;

use lumen_auth_core::AuthService;
use lumen_store::{MemoryIdentityDirectory, MemoryStore};
use lumen_types::SystemClock;

use crate::config::Config;
use crate::mailer::{LogMailer, MagicLinkMailer};
use crate::oauth::GoogleOauthClient;

/// Type alias for the auth service with concrete backing types
pub type AuthServiceImpl = AuthService<MemoryIdentityDirectory, MemoryStore>;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Auth service for the login flows and session resolution
    pub auth: Arc<AuthServiceImpl>,
    /// Delivery channel for magic-link emails
    pub mailer: Arc<dyn MagicLinkMailer>,
    /// OAuth client, present only when the provider is configured
    pub google: Option<Arc<GoogleOauthClient>>,
    /// Backing store handle, kept for the periodic expiry purge
    pub store: Arc<MemoryStore>,
    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Build the state from configuration
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let clock = Arc::new(SystemClock);
        let directory = Arc::new(MemoryIdentityDirectory::new());
        let store = Arc::new(MemoryStore::new(clock.clone()));

        let auth = AuthServiceImpl::new(config.auth.clone(), directory, store.clone(), clock)?;

        let google = config
            .google
            .as_ref()
            .map(|g| GoogleOauthClient::new(g.clone()).map(Arc::new))
            .transpose()?;

        Ok(Self {
            auth: Arc::new(auth),
            mailer: Arc::new(LogMailer),
            google,
            store,
            config: Arc::new(config),
        })
    }
}
