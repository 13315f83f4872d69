//! Session handlers (me, logout)

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use lumen_auth_core::clear_session_cookie;

use crate::error::ApiResult;
use crate::extractors::CurrentUser;
use crate::handlers::magic_link::UserInfo;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: UserInfo,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}

/// GET /api/v1/auth/me
///
/// Current user from the session cookie
pub async fn me(CurrentUser(identity): CurrentUser) -> ApiResult<Json<MeResponse>> {
    Ok(Json(MeResponse {
        user: UserInfo::from(&identity),
    }))
}

/// POST /api/v1/auth/logout
///
/// Clear the session cookie. Sessions are stateless, so the previously
/// minted token remains valid until its embedded expiry; logout is
/// a client-side discard enforced by overwriting the cookie.
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    let cookie = clear_session_cookie(state.auth.secure_cookies());
    (
        [(header::SET_COOKIE, cookie)],
        Json(LogoutResponse { success: true }),
    )
}
