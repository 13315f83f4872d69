//! Entitlement handler

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use lumen_types::EntitlementRecord;

use crate::error::ApiResult;
use crate::extractors::CurrentUser;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct EntitlementResponse {
    pub plan: String,
    pub status: String,
    pub entitled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub renew_at: Option<String>,
}

impl From<EntitlementRecord> for EntitlementResponse {
    fn from(record: EntitlementRecord) -> Self {
        Self {
            plan: record.plan.to_string(),
            status: record.status.to_string(),
            entitled: record.is_entitled(),
            renew_at: record.renew_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// GET /api/v1/entitlement
///
/// The current user's plan, created as free/active on first query
pub async fn get_entitlement(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
) -> ApiResult<Json<EntitlementResponse>> {
    let record = state.auth.entitlement_or_default(identity.id).await?;
    Ok(Json(EntitlementResponse::from(record)))
}
