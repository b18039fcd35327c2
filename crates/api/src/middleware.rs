//! API middleware.

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use afisha_core::{EventService, PollService, StatsService, UserService};

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub event_service: EventService,
    pub poll_service: PollService,
    pub stats_service: StatsService,
    /// Bot token, the key material for `initData` verification.
    pub bot_token: String,
}

/// Authentication middleware.
///
/// Resolves `Authorization: Bearer <token>` to a user and stashes the
/// model in request extensions for the extractors. Unauthenticated
/// requests pass through; route handlers decide whether auth is required.
/// Also stamps the user's activity, best-effort.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
        && let Ok(user) = state.user_service.authenticate_by_token(token).await
    {
        state.user_service.touch(user.telegram_id).await;
        req.extensions_mut().insert(user);
    }

    next.run(req).await
}
