//! Configuration for the Auth API service.

use lumen_auth_core::{AuthConfig, Environment};

/// Auth API configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub http_port: u16,

    /// Public base URL used in magic-link emails and OAuth redirects
    pub public_base_url: String,

    /// Auth core configuration
    pub auth: AuthConfig,

    /// Google OAuth client, present only when configured
    pub google: Option<GoogleConfig>,
}

/// Google OAuth client settings
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Callback URL registered with the provider
    pub redirect_url: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let http_port = std::env::var("HTTP_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("HTTP_PORT"))?;

        let public_base_url = std::env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("http://localhost:{http_port}"));

        let environment = match std::env::var("ENVIRONMENT").as_deref() {
            Ok("production") => Environment::Production,
            _ => Environment::Development,
        };

        // Comma-separated, newest first; verification accepts all of
        // them so an old secret can ride out a rotation window
        let secrets: Vec<String> = std::env::var("AUTH_SECRETS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        let auth = AuthConfig::new(environment, secrets)
            .map_err(|e| ConfigError::AuthConfig(e.to_string()))?;

        let auth = match std::env::var("SESSION_TTL_DAYS") {
            Ok(days) => {
                let days: i64 = days
                    .parse()
                    .map_err(|_| ConfigError::Invalid("SESSION_TTL_DAYS"))?;
                auth.with_session_ttl(chrono::Duration::days(days))
            }
            Err(_) => auth,
        };

        let auth = match std::env::var("MAGIC_LINK_TTL_MINUTES") {
            Ok(minutes) => {
                let minutes: i64 = minutes
                    .parse()
                    .map_err(|_| ConfigError::Invalid("MAGIC_LINK_TTL_MINUTES"))?;
                auth.with_magic_link_ttl(chrono::Duration::minutes(minutes))
            }
            Err(_) => auth,
        };

        let google = match (
            std::env::var("GOOGLE_CLIENT_ID"),
            std::env::var("GOOGLE_CLIENT_SECRET"),
        ) {
            (Ok(client_id), Ok(client_secret)) => {
                let redirect_url = std::env::var("GOOGLE_REDIRECT_URL").unwrap_or_else(|_| {
                    format!("{public_base_url}/api/v1/auth/oauth/google/callback")
                });
                Some(GoogleConfig {
                    client_id,
                    client_secret,
                    redirect_url,
                })
            }
            (Err(_), Err(_)) => None,
            _ => return Err(ConfigError::Invalid("GOOGLE_CLIENT_ID/GOOGLE_CLIENT_SECRET")),
        };

        Ok(Self {
            http_port,
            public_base_url,
            auth,
            google,
        })
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("Auth config error: {0}")]
    AuthConfig(String),
}
