//! Admin panel endpoints.

use axum::{Router, extract::State, routing::get};
use afisha_common::AppResult;
use afisha_core::UserActivity;
use serde::Serialize;

use crate::{extractors::AdminUser, middleware::AppState, response::ApiResponse};

/// User activity listing response.
#[derive(Serialize)]
pub struct UsersResponse {
    pub users: Vec<UserActivity>,
}

/// Users ordered by recency with a five-minute activity flag.
async fn list_users(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<UsersResponse>> {
    let users = state.stats_service.list_users().await?;
    Ok(ApiResponse::ok(UsersResponse { users }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/users", get(list_users))
}
