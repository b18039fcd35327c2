//! API endpoints.

mod admin;
mod auth;
mod events;
mod polls;
mod stats;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/events", events::router())
        .nest("/polls", polls::router())
        .nest("/admin", admin::router())
        .merge(stats::router())
}
