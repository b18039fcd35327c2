//! Authentication endpoints.

use axum::{Json, Router, extract::State, http::HeaderMap, routing::post};
use afisha_common::{AppError, AppResult, verify_init_data};
use serde::{Deserialize, Serialize};

use crate::{middleware::AppState, response::ApiResponse};

/// Init request. `initData` may arrive in the body or in the
/// `X-Telegram-Init-Data` header.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitRequest {
    pub init_data: Option<String>,
}

/// Init response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitResponse {
    pub success: bool,
    pub user_id: i64,
    pub token: String,
    pub is_admin: bool,
}

/// Verify `initData`, resolve the identity and hand out a bearer token.
async fn init(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Option<Json<InitRequest>>,
) -> AppResult<ApiResponse<InitResponse>> {
    let from_header = headers
        .get("X-Telegram-Init-Data")
        .and_then(|value| value.to_str().ok())
        .map(ToOwned::to_owned);

    let raw = body
        .and_then(|Json(req)| req.init_data)
        .or(from_header)
        .ok_or_else(|| AppError::BadRequest("No init data provided".to_string()))?;

    let init_data = verify_init_data(&raw, &state.bot_token)?;
    let webapp_user = init_data.require_user()?;

    let user = state
        .user_service
        .resolve(webapp_user.id, webapp_user.username.as_deref())
        .await?;

    let token = state.user_service.issue_token(user.telegram_id)?;

    Ok(ApiResponse::ok(InitResponse {
        success: true,
        user_id: user.telegram_id,
        token,
        is_admin: user.is_admin,
    }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/init", post(init))
}
