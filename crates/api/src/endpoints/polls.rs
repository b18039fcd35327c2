//! Poll endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use afisha_common::AppResult;
use afisha_core::{CreatePollInput, PollView, UpdatePollInput, poll::tally_options};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    extractors::{AdminUser, AuthUser, MaybeAuthUser},
    middleware::AppState,
    response::{ApiResponse, ok},
};

/// Poll response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollResponse {
    pub id: i32,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub end_date: String,
    pub is_closed: bool,
    pub has_voted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_vote: Option<i32>,
    pub options: Vec<PollOptionResponse>,
}

/// Poll option response. Vote counts and percentages are only revealed
/// to callers who have voted (and on admin views).
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollOptionResponse {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub votes: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage: Option<f64>,
    pub is_voted: bool,
}

/// Build a response from a view, revealing results only when asked.
fn poll_response(view: PollView, include_results: bool) -> PollResponse {
    let has_voted = view.user_vote.is_some();
    let reveal = include_results || has_voted;
    let tally = tally_options(&view.options);

    let options = view
        .options
        .iter()
        .zip(tally)
        .map(|(option, entry)| PollOptionResponse {
            text: entry.text,
            votes: reveal.then_some(entry.votes),
            percentage: reveal.then_some(entry.percentage),
            is_voted: view.user_vote == Some(option.position),
        })
        .collect();

    PollResponse {
        id: view.poll.id,
        title: view.poll.title,
        description: view.poll.description,
        end_date: DateTime::<Utc>::from(view.poll.ends_at).to_rfc3339(),
        is_closed: view.is_closed,
        has_voted,
        user_vote: view.user_vote,
        options,
    }
}

/// Active polls with the caller's voted state.
async fn list_polls(
    MaybeAuthUser(maybe_user): MaybeAuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<PollResponse>>> {
    let user_id = maybe_user.map(|user| user.id);
    let views = state.poll_service.list_active(user_id).await?;
    Ok(ApiResponse::ok(
        views.into_iter().map(|view| poll_response(view, false)).collect(),
    ))
}

/// Every poll with full tallies (admin only).
async fn list_all_polls(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<PollResponse>>> {
    let views = state.poll_service.list_all().await?;
    Ok(ApiResponse::ok(
        views.into_iter().map(|view| poll_response(view, true)).collect(),
    ))
}

/// A single poll with its tally (admin only).
async fn get_poll(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<ApiResponse<PollResponse>> {
    let view = state.poll_service.get(id, None).await?;
    Ok(ApiResponse::ok(poll_response(view, true)))
}

/// Create a poll (admin only).
async fn create_poll(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Json(input): Json<CreatePollInput>,
) -> AppResult<ApiResponse<PollResponse>> {
    let view = state.poll_service.create(input, admin.id).await?;
    Ok(ApiResponse::ok(poll_response(view, true)))
}

/// Update a poll (admin only). Options matched by text keep their votes.
async fn update_poll(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(input): Json<UpdatePollInput>,
) -> AppResult<ApiResponse<PollResponse>> {
    let view = state.poll_service.update(id, input).await?;
    Ok(ApiResponse::ok(poll_response(view, true)))
}

/// Delete a poll (admin only). Votes cascade.
async fn delete_poll(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<impl axum::response::IntoResponse> {
    state.poll_service.delete(id).await?;
    Ok(ok())
}

/// Vote request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub option_index: i32,
}

/// Cast a vote, then return the poll with results revealed.
async fn vote(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(req): Json<VoteRequest>,
) -> AppResult<ApiResponse<PollResponse>> {
    state.poll_service.cast_vote(id, user.id, req.option_index).await?;

    let view = state.poll_service.get(id, Some(user.id)).await?;
    Ok(ApiResponse::ok(poll_response(view, true)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_polls).post(create_poll))
        .route("/all", get(list_all_polls))
        .route("/{id}", get(get_poll).put(update_poll).delete(delete_poll))
        .route("/{id}/vote", post(vote))
}

#[cfg(test)]
mod tests {
    use super::*;
    use afisha_db::entities::{poll, poll_option};
    use chrono::Duration;

    fn view(user_vote: Option<i32>) -> PollView {
        let now = Utc::now();
        PollView {
            poll: poll::Model {
                id: 1,
                title: "Topic".to_string(),
                description: None,
                ends_at: (now + Duration::hours(1)).into(),
                created_by: None,
                created_at: now.into(),
            },
            options: vec![
                poll_option::Model {
                    id: 10,
                    poll_id: 1,
                    position: 0,
                    text: "A".to_string(),
                    votes_count: 1,
                },
                poll_option::Model {
                    id: 11,
                    poll_id: 1,
                    position: 1,
                    text: "B".to_string(),
                    votes_count: 0,
                },
            ],
            user_vote,
            is_closed: false,
        }
    }

    #[test]
    fn results_hidden_until_voted() {
        let response = poll_response(view(None), false);
        assert!(!response.has_voted);
        assert!(response.options[0].votes.is_none());
        assert!(response.options[0].percentage.is_none());
    }

    #[test]
    fn results_revealed_after_voting() {
        let response = poll_response(view(Some(0)), false);
        assert!(response.has_voted);
        assert_eq!(response.options[0].votes, Some(1));
        assert_eq!(response.options[0].percentage, Some(100.0));
        assert_eq!(response.options[1].percentage, Some(0.0));
        assert!(response.options[0].is_voted);
        assert!(!response.options[1].is_voted);
    }

    #[test]
    fn admin_views_always_reveal() {
        let response = poll_response(view(None), true);
        assert_eq!(response.options[0].votes, Some(1));
    }
}
