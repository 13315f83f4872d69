//! Magic-link delivery

use async_trait::async_trait;

/// Delivery channel for magic-link URLs
#[async_trait]
pub trait MagicLinkMailer: Send + Sync {
    /// Send the login URL to the address that requested it
    async fn send_magic_link(&self, email: &str, url: &str) -> anyhow::Result<()>;
}

/// Development mailer that logs the link instead of sending it
pub struct LogMailer;

#[async_trait]
impl MagicLinkMailer for LogMailer {
    async fn send_magic_link(&self, email: &str, url: &str) -> anyhow::Result<()> {
        tracing::info!(email = %email, url = %url, "magic link (log delivery)");
        Ok(())
    }
}
