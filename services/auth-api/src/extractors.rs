//! Axum extractors for authentication

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use lumen_auth_core::SESSION_COOKIE;
use lumen_types::Identity;

use crate::state::AppState;

/// Authenticated user extracted from the session cookie
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Identity);

/// Error response for auth failures
#[derive(Debug, Serialize)]
struct AuthErrorResponse {
    error: AuthErrorDetail,
}

#[derive(Debug, Serialize)]
struct AuthErrorDetail {
    code: &'static str,
    message: &'static str,
}

/// Auth rejection type
///
/// Deliberately carries one shape only: whatever went wrong with the
/// presented credential, the caller sees the same response.
pub struct AuthRejection;

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let body = AuthErrorResponse {
            error: AuthErrorDetail {
                code: "UNAUTHENTICATED",
                message: "Authentication failed",
            },
        };
        (StatusCode::UNAUTHORIZED, Json(body)).into_response()
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        state: &'life1 S,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            let app_state = AppState::from_ref(state);

            let token = extract_token(parts).ok_or(AuthRejection)?;

            let identity = app_state.auth.resolve_session(&token).map_err(|e| {
                tracing::debug!(error = %e, "session resolution failed");
                AuthRejection
            })?;

            Ok(CurrentUser(identity))
        })
    }
}

/// Extract the session token from the cookie or a Bearer header
fn extract_token(parts: &Parts) -> Option<String> {
    if let Some(cookie_header) = parts.headers.get(header::COOKIE) {
        if let Ok(cookie_str) = cookie_header.to_str() {
            for cookie in cookie_str.split(';') {
                let cookie = cookie.trim();
                if let Some(value) = cookie.strip_prefix(SESSION_COOKIE) {
                    if let Some(value) = value.strip_prefix('=') {
                        if !value.is_empty() {
                            return Some(value.to_string());
                        }
                    }
                }
            }
        }
    }

    let auth_header = parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    auth_header.strip_prefix("Bearer ").map(String::from)
}

/// Rate-limit key for a request: the first hop of X-Forwarded-For when
/// present, the peer address otherwise.
pub fn client_key(headers: &HeaderMap, ConnectInfo(addr): &ConnectInfo<SocketAddr>) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| addr.ip().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(name: axum::http::HeaderName, value: &str) -> Parts {
        let (parts, ()) = Request::builder()
            .header(name, value)
            .body(())
            .unwrap()
            .into_parts();
        parts
    }

    #[test]
    fn test_token_from_cookie() {
        let parts = parts_with(header::COOKIE, "other=1; lumen_session=abc.def; x=2");
        assert_eq!(extract_token(&parts).as_deref(), Some("abc.def"));
    }

    #[test]
    fn test_empty_cookie_ignored() {
        // A cleared cookie must not present as a credential
        let parts = parts_with(header::COOKIE, "lumen_session=");
        assert_eq!(extract_token(&parts), None);
    }

    #[test]
    fn test_prefix_cookie_name_not_matched() {
        let parts = parts_with(header::COOKIE, "lumen_session_old=abc");
        assert_eq!(extract_token(&parts), None);
    }

    #[test]
    fn test_token_from_bearer_header() {
        let parts = parts_with(header::AUTHORIZATION, "Bearer abc.def");
        assert_eq!(extract_token(&parts).as_deref(), Some("abc.def"));
    }

    #[test]
    fn test_no_credential() {
        let (parts, ()) = Request::builder().body(()).unwrap().into_parts();
        assert_eq!(extract_token(&parts), None);
    }

    #[test]
    fn test_client_key_prefers_forwarded_hop() {
        let addr = ConnectInfo("10.0.0.9:4444".parse::<SocketAddr>().unwrap());
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.7, 10.0.0.1".parse().unwrap());
        assert_eq!(client_key(&headers, &addr), "203.0.113.7");
    }

    #[test]
    fn test_client_key_falls_back_to_peer() {
        let addr = ConnectInfo("10.0.0.9:4444".parse::<SocketAddr>().unwrap());
        assert_eq!(client_key(&HeaderMap::new(), &addr), "10.0.0.9");
    }
}
