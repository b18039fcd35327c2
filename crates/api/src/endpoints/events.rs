//! Event endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use afisha_common::AppResult;
use afisha_core::{CreateEventInput, UpdateEventInput};
use afisha_db::{
    entities::event,
    repositories::{EventFilter, EventScope},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    extractors::{AdminUser, AuthUser},
    middleware::AppState,
    response::{ApiResponse, ok},
};

/// Event response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
    pub id: i32,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_participants: Option<i32>,
    pub created_at: String,
}

impl From<event::Model> for EventResponse {
    fn from(event: event::Model) -> Self {
        Self {
            id: event.id,
            title: event.title,
            description: event.description,
            date: DateTime::<Utc>::from(event.starts_at).to_rfc3339(),
            end_date: event.ends_at.map(|t| DateTime::<Utc>::from(t).to_rfc3339()),
            location: event.location,
            category: event.category,
            max_participants: event.max_participants,
            created_at: DateTime::<Utc>::from(event.created_at).to_rfc3339(),
        }
    }
}

/// Event listing query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct EventsQuery {
    /// `upcoming` (default) or `past`.
    #[serde(rename = "type")]
    pub scope: Option<String>,
    pub category: Option<String>,
    /// Calendar month 1-12.
    pub month: Option<u32>,
    pub search: Option<String>,
}

impl From<EventsQuery> for EventFilter {
    fn from(query: EventsQuery) -> Self {
        Self {
            scope: match query.scope.as_deref() {
                Some("past") => EventScope::Past,
                _ => EventScope::Upcoming,
            },
            category: query.category.filter(|c| !c.is_empty()),
            month: query.month.filter(|m| (1..=12).contains(m)),
            search: query.search.filter(|s| !s.is_empty()),
        }
    }
}

/// Filtered event listing.
async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
) -> AppResult<ApiResponse<Vec<EventResponse>>> {
    let events = state.event_service.list(&query.into()).await?;
    Ok(ApiResponse::ok(events.into_iter().map(Into::into).collect()))
}

/// The caller's saved events.
async fn list_saved(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<EventResponse>>> {
    let events = state.event_service.list_saved(user.id).await?;
    Ok(ApiResponse::ok(events.into_iter().map(Into::into).collect()))
}

/// Get a single event.
async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<ApiResponse<EventResponse>> {
    let event = state.event_service.get(id).await?;
    Ok(ApiResponse::ok(event.into()))
}

/// Create an event (admin only).
async fn create_event(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Json(input): Json<CreateEventInput>,
) -> AppResult<ApiResponse<EventResponse>> {
    let event = state.event_service.create(input, admin.id).await?;
    Ok(ApiResponse::ok(event.into()))
}

/// Update an event (admin only).
async fn update_event(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(input): Json<UpdateEventInput>,
) -> AppResult<ApiResponse<EventResponse>> {
    let event = state.event_service.update(id, input).await?;
    Ok(ApiResponse::ok(event.into()))
}

/// Delete an event (admin only).
async fn delete_event(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<impl axum::response::IntoResponse> {
    state.event_service.delete(id).await?;
    Ok(ok())
}

/// Save an event for the caller.
async fn save_event(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<impl axum::response::IntoResponse> {
    state.event_service.save(user.id, id).await?;
    Ok(ok())
}

/// Remove the caller's save.
async fn unsave_event(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<impl axum::response::IntoResponse> {
    state.event_service.unsave(user.id, id).await?;
    Ok(ok())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_events).post(create_event))
        .route("/saved", get(list_saved))
        .route("/{id}", get(get_event).put(update_event).delete(delete_event))
        .route("/{id}/save", post(save_event).delete(unsave_event))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_maps_to_filter() {
        let query = EventsQuery {
            scope: Some("past".to_string()),
            category: Some(String::new()),
            month: Some(13),
            search: Some("rust".to_string()),
        };
        let filter: EventFilter = query.into();
        assert_eq!(filter.scope, EventScope::Past);
        assert!(filter.category.is_none());
        assert!(filter.month.is_none());
        assert_eq!(filter.search.as_deref(), Some("rust"));
    }

    #[test]
    fn scope_defaults_to_upcoming() {
        let filter: EventFilter = EventsQuery::default().into();
        assert_eq!(filter.scope, EventScope::Upcoming);
    }
}
