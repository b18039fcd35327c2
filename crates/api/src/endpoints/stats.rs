//! Admin dashboard statistics endpoint.

use axum::{Router, extract::State, routing::get};
use afisha_common::AppResult;
use afisha_core::StatsOverview;

use crate::{extractors::AdminUser, middleware::AppState, response::ApiResponse};

/// Aggregate counts for the admin dashboard.
async fn stats(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<StatsOverview>> {
    let overview = state.stats_service.overview().await?;
    Ok(ApiResponse::ok(overview))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/stats", get(stats))
}
