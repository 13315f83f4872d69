//! OAuth handlers (redirect start, provider callback)

use axum::extract::{ConnectInfo, Query, State};
use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Redirect, Response};
use serde::Deserialize;
use std::net::SocketAddr;

use lumen_auth_core::session_cookie;

use crate::error::{ApiError, ApiResult};
use crate::extractors::client_key;
use crate::state::AppState;

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StartParams {
    pub locale: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    /// Set by the provider when the user denies consent
    pub error: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/auth/oauth/google
///
/// Redirect the browser to the provider with a signed state value.
/// Throttled per client: state minting is open to unauthenticated
/// callers just like the magic-link endpoint.
pub async fn oauth_start(
    State(state): State<AppState>,
    connect_info: ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Query(params): Query<StartParams>,
) -> ApiResult<Redirect> {
    let Some(google) = &state.google else {
        return Err(ApiError::BadRequest("oauth is not configured".into()));
    };

    let client = client_key(&headers, &connect_info);
    let oauth_state = state.auth.begin_oauth(params.locale, &client)?;
    let url = google.authorize_url(&oauth_state)?;
    Ok(Redirect::to(&url))
}

/// GET /api/v1/auth/oauth/google/callback
///
/// Validate the returned state, exchange the code, and establish a
/// session cookie. This lands a browser, not an API client, so every
/// failure redirects to a generic retry path; no cryptographic detail
/// reaches the response.
pub async fn oauth_callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Response {
    match complete_login(&state, params).await {
        Ok(response) => response,
        Err(err) => {
            tracing::debug!(error = %err, "oauth callback failed");
            let retry = format!("{}/login?error=retry", state.config.public_base_url);
            Redirect::to(&retry).into_response()
        }
    }
}

async fn complete_login(
    state: &AppState,
    params: CallbackParams,
) -> Result<Response, ApiError> {
    let Some(google) = &state.google else {
        return Err(ApiError::BadRequest("oauth is not configured".into()));
    };

    if let Some(error) = params.error {
        tracing::debug!(error = %error, "oauth consent denied");
        return Err(ApiError::Unauthenticated);
    }

    // A missing or forged state denies before any provider call
    let state_value = params.state.ok_or(ApiError::Unauthenticated)?;
    let locale = state.auth.consume_oauth_state(&state_value)?;

    let code = params.code.ok_or(ApiError::Unauthenticated)?;
    let email = google.exchange_code(&code).await?;

    let (_, session) = state.auth.oauth_login(&email, locale.clone()).await?;

    let cookie = session_cookie(
        &session,
        state.auth.session_ttl_seconds(),
        state.auth.secure_cookies(),
    );

    let destination = match locale.as_deref() {
        Some(locale) => format!("{}/{locale}/", state.config.public_base_url),
        None => format!("{}/", state.config.public_base_url),
    };

    Ok((
        [(header::SET_COOKIE, cookie)],
        Redirect::to(&destination),
    )
        .into_response())
}
