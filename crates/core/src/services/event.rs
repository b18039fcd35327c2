//! Event service.

use afisha_common::{AppError, AppResult};
use afisha_db::{
    entities::event,
    repositories::{EventFilter, EventRepository, ReminderRepository, SavedEventRepository},
};
use chrono::{DateTime, Duration, Utc};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

/// Event service for business logic.
#[derive(Clone)]
pub struct EventService {
    event_repo: EventRepository,
    saved_repo: SavedEventRepository,
    reminder_repo: ReminderRepository,
    /// How long before the start a reminder fires.
    reminder_lead: Duration,
}

/// Input for creating an event.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventInput {
    #[validate(length(min = 1, max = 256))]
    pub title: String,

    pub description: Option<String>,

    pub starts_at: DateTime<Utc>,

    pub ends_at: Option<DateTime<Utc>>,

    #[validate(length(max = 256))]
    pub location: Option<String>,

    #[validate(length(max = 64))]
    pub category: Option<String>,

    #[validate(range(min = 1))]
    pub max_participants: Option<i32>,
}

/// Input for updating an event. Same shape as creation: the admin form
/// always submits the full row.
pub type UpdateEventInput = CreateEventInput;

impl EventService {
    /// Create a new event service.
    #[must_use]
    pub const fn new(
        event_repo: EventRepository,
        saved_repo: SavedEventRepository,
        reminder_repo: ReminderRepository,
        reminder_lead: Duration,
    ) -> Self {
        Self {
            event_repo,
            saved_repo,
            reminder_repo,
            reminder_lead,
        }
    }

    /// List events matching the filter.
    pub async fn list(&self, filter: &EventFilter) -> AppResult<Vec<event::Model>> {
        self.event_repo.list(filter, Utc::now()).await
    }

    /// All events, for the admin panel.
    pub async fn list_all(&self) -> AppResult<Vec<event::Model>> {
        self.event_repo.list_all().await
    }

    /// Get a single event.
    pub async fn get(&self, id: i32) -> AppResult<event::Model> {
        self.event_repo.get_by_id(id).await
    }

    /// Create an event (admin action) and schedule its broadcast reminder.
    pub async fn create(
        &self,
        input: CreateEventInput,
        created_by: i32,
    ) -> AppResult<event::Model> {
        input.validate()?;

        let model = event::ActiveModel {
            title: Set(input.title),
            description: Set(input.description),
            starts_at: Set(input.starts_at.into()),
            ends_at: Set(input.ends_at.map(Into::into)),
            location: Set(input.location),
            category: Set(input
                .category
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| "other".to_string())),
            max_participants: Set(input.max_participants),
            created_by: Set(Some(created_by)),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };

        let created = self.event_repo.create(model).await?;

        // Best-effort: a missing reminder must not fail event creation.
        if let Err(e) = self.schedule_reminder(&created, None).await {
            tracing::warn!(event_id = created.id, error = %e, "Failed to schedule reminder");
        }

        Ok(created)
    }

    /// Update an event (admin action).
    pub async fn update(&self, id: i32, input: UpdateEventInput) -> AppResult<event::Model> {
        input.validate()?;

        let existing = self.event_repo.get_by_id(id).await?;

        let mut model: event::ActiveModel = existing.into();
        model.title = Set(input.title);
        model.description = Set(input.description);
        model.starts_at = Set(input.starts_at.into());
        model.ends_at = Set(input.ends_at.map(Into::into));
        model.location = Set(input.location);
        if let Some(category) = input.category.filter(|c| !c.trim().is_empty()) {
            model.category = Set(category);
        }
        model.max_participants = Set(input.max_participants);

        self.event_repo.update(model).await
    }

    /// Delete an event (admin action). Saves and reminders cascade.
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        // Surface 404 before issuing the delete.
        self.event_repo.get_by_id(id).await?;
        self.event_repo.delete(id).await
    }

    /// Save an event for a user and schedule their personal reminder.
    pub async fn save(&self, user_id: i32, event_id: i32) -> AppResult<()> {
        let event = self.event_repo.get_by_id(event_id).await?;
        self.saved_repo.create(user_id, event_id).await?;

        if let Err(e) = self.schedule_reminder(&event, Some(user_id)).await {
            tracing::warn!(event_id, user_id, error = %e, "Failed to schedule reminder");
        }

        Ok(())
    }

    /// Remove a user's save.
    pub async fn unsave(&self, user_id: i32, event_id: i32) -> AppResult<()> {
        if self.saved_repo.delete(user_id, event_id).await? {
            Ok(())
        } else {
            Err(AppError::NotFound("Event is not saved".to_string()))
        }
    }

    /// Events the user has saved.
    pub async fn list_saved(&self, user_id: i32) -> AppResult<Vec<event::Model>> {
        self.saved_repo.list_events_for_user(user_id).await
    }

    /// Schedule a reminder `reminder_lead` before the event starts.
    /// Skipped when that instant is already in the past.
    async fn schedule_reminder(&self, event: &event::Model, user_id: Option<i32>) -> AppResult<()> {
        let remind_at = DateTime::<Utc>::from(event.starts_at) - self.reminder_lead;
        if remind_at <= Utc::now() {
            return Ok(());
        }
        self.reminder_repo.create(event.id, user_id, remind_at).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn test_event(id: i32, starts_at: DateTime<Utc>) -> event::Model {
        event::Model {
            id,
            title: "Community meetup".to_string(),
            description: None,
            starts_at: starts_at.into(),
            ends_at: None,
            location: Some("Tech park".to_string()),
            category: "meetup".to_string(),
            max_participants: None,
            created_by: Some(1),
            created_at: Utc::now().into(),
        }
    }

    fn service(db: sea_orm::DatabaseConnection) -> EventService {
        let db = Arc::new(db);
        EventService::new(
            EventRepository::new(Arc::clone(&db)),
            SavedEventRepository::new(Arc::clone(&db)),
            ReminderRepository::new(db),
            Duration::minutes(60),
        )
    }

    #[tokio::test]
    async fn create_rejects_empty_title() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let service = service(db);

        let input = CreateEventInput {
            title: String::new(),
            description: None,
            starts_at: Utc::now(),
            ends_at: None,
            location: None,
            category: None,
            max_participants: None,
        };

        assert!(matches!(
            service.create(input, 1).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn create_defaults_category_and_schedules_reminder() {
        let starts_at = Utc::now() + Duration::days(7);
        let created = test_event(5, starts_at);
        let reminder = afisha_db::entities::reminder::Model {
            id: 1,
            event_id: 5,
            user_id: None,
            remind_at: (starts_at - Duration::minutes(60)).into(),
            sent: false,
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            // Insert event returning, then insert reminder returning.
            .append_query_results([vec![created]])
            .append_query_results([vec![reminder]])
            .into_connection();

        let service = service(db);
        let input = CreateEventInput {
            title: "Community meetup".to_string(),
            description: None,
            starts_at,
            ends_at: None,
            location: None,
            category: None,
            max_participants: None,
        };

        let event = service.create(input, 1).await.unwrap();
        assert_eq!(event.id, 5);
    }

    #[tokio::test]
    async fn unsave_missing_row_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        let service = service(db);
        assert!(matches!(
            service.unsave(1, 2).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn delete_missing_event_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<event::Model>::new()])
            .into_connection();

        let service = service(db);
        assert!(matches!(
            service.delete(9).await,
            Err(AppError::EventNotFound(9))
        ));
    }
}
