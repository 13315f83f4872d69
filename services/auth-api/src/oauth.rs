//! Google OAuth client
//!
//! Thin wrapper over the authorization-code flow: build the redirect
//! URL, then exchange the returned code for the user's verified email.
//! The anti-CSRF state value is minted and checked by the auth core.

use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::config::GoogleConfig;
use crate::error::ApiError;

const AUTH_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
const USERINFO_ENDPOINT: &str = "https://openidconnect.googleapis.com/v1/userinfo";

const EXCHANGE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    email: String,
    #[serde(default)]
    email_verified: bool,
}

/// Client for the provider's token and userinfo endpoints
pub struct GoogleOauthClient {
    http: reqwest::Client,
    config: GoogleConfig,
}

impl GoogleOauthClient {
    /// Build the client with bounded timeouts
    pub fn new(config: GoogleConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(EXCHANGE_TIMEOUT)
            .build()?;
        Ok(Self { http, config })
    }

    /// Authorization URL the browser is redirected to
    pub fn authorize_url(&self, state: &str) -> Result<String, ApiError> {
        let mut url = Url::parse(AUTH_ENDPOINT)
            .map_err(|e| ApiError::Internal(format!("authorize endpoint: {e}")))?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_url)
            .append_pair("response_type", "code")
            .append_pair("scope", "openid email")
            .append_pair("state", state);
        Ok(url.into())
    }

    /// Exchange an authorization code for the account's verified email
    pub async fn exchange_code(&self, code: &str) -> Result<String, ApiError> {
        let token: TokenResponse = self
            .http
            .post(TOKEN_ENDPOINT)
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("redirect_uri", self.config.redirect_url.as_str()),
                ("grant_type", "authorization_code"),
                ("code", code),
            ])
            .send()
            .await
            .map_err(|e| ApiError::Provider(format!("token exchange: {e}")))?
            .error_for_status()
            .map_err(|e| ApiError::Provider(format!("token exchange: {e}")))?
            .json()
            .await
            .map_err(|e| ApiError::Provider(format!("token response: {e}")))?;

        let info: UserInfo = self
            .http
            .get(USERINFO_ENDPOINT)
            .bearer_auth(&token.access_token)
            .send()
            .await
            .map_err(|e| ApiError::Provider(format!("userinfo: {e}")))?
            .error_for_status()
            .map_err(|e| ApiError::Provider(format!("userinfo: {e}")))?
            .json()
            .await
            .map_err(|e| ApiError::Provider(format!("userinfo response: {e}")))?;

        if !info.email_verified {
            tracing::warn!("oauth account email not verified by provider");
            return Err(ApiError::Unauthenticated);
        }

        Ok(info.email)
    }
}

impl std::fmt::Debug for GoogleOauthClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleOauthClient")
            .field("client_id", &self.config.client_id)
            .finish_non_exhaustive()
    }
}
