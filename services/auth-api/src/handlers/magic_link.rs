//! Magic-link handlers (request, verify)

use axum::extract::{ConnectInfo, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

use lumen_auth_core::session_cookie;

use crate::error::{ApiError, ApiResult};
use crate::extractors::client_key;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct MagicLinkRequest {
    pub email: String,
    pub locale: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MagicLinkResponse {
    pub sent: bool,
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub user: UserInfo,
}

#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: String,
    pub email: String,
    pub display_name: String,
}

impl From<&lumen_types::Identity> for UserInfo {
    fn from(identity: &lumen_types::Identity) -> Self {
        Self {
            id: identity.id.to_string(),
            email: identity.email.clone(),
            display_name: identity.display_name.clone(),
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/auth/magic-link
///
/// Issue a single-use login link and send it to the address. The
/// response is the same whether or not the address has an account.
pub async fn request_magic_link(
    State(state): State<AppState>,
    connect_info: ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(req): Json<MagicLinkRequest>,
) -> ApiResult<impl IntoResponse> {
    if !req.email.contains('@') {
        return Err(ApiError::BadRequest("a valid email is required".into()));
    }

    let client = client_key(&headers, &connect_info);
    let token = state
        .auth
        .request_magic_link(&req.email, req.locale, &client)
        .await?;

    let url = format!(
        "{}/login/magic?token={token}",
        state.config.public_base_url
    );
    state
        .mailer
        .send_magic_link(&req.email, &url)
        .await
        .map_err(|e| ApiError::Internal(format!("magic link delivery: {e}")))?;

    Ok((StatusCode::ACCEPTED, Json(MagicLinkResponse { sent: true })))
}

/// POST /api/v1/auth/magic-link/verify
///
/// Redeem a magic link (single use) and establish a session cookie
pub async fn verify_magic_link(
    State(state): State<AppState>,
    Json(req): Json<VerifyRequest>,
) -> ApiResult<impl IntoResponse> {
    let (identity, session) = state.auth.redeem_magic_link(&req.token).await?;

    let cookie = session_cookie(
        &session,
        state.auth.session_ttl_seconds(),
        state.auth.secure_cookies(),
    );

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(VerifyResponse {
            user: UserInfo::from(&identity),
        }),
    ))
}
