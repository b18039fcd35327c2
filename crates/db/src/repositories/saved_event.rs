//! Saved event repository.

use std::sync::Arc;

use crate::entities::{Event, SavedEvent, User, event, saved_event, user};
use afisha_common::{AppError, AppResult};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, JoinType, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, SqlErr,
};

/// Saved event repository for database operations.
#[derive(Clone)]
pub struct SavedEventRepository {
    db: Arc<DatabaseConnection>,
}

impl SavedEventRepository {
    /// Create a new saved event repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Save an event for a user.
    ///
    /// A duplicate save loses against the unique (`user_id`, `event_id`)
    /// index and surfaces as `Conflict`.
    pub async fn create(&self, user_id: i32, event_id: i32) -> AppResult<saved_event::Model> {
        let model = saved_event::ActiveModel {
            user_id: Set(user_id),
            event_id: Set(event_id),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };

        model.insert(self.db.as_ref()).await.map_err(|e| {
            if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                AppError::Conflict("Event already saved".to_string())
            } else {
                AppError::Database(e.to_string())
            }
        })
    }

    /// Remove a save. Returns whether a row was deleted.
    pub async fn delete(&self, user_id: i32, event_id: i32) -> AppResult<bool> {
        let result = SavedEvent::delete_many()
            .filter(saved_event::Column::UserId.eq(user_id))
            .filter(saved_event::Column::EventId.eq(event_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected > 0)
    }

    /// Whether the user has saved the event.
    pub async fn exists(&self, user_id: i32, event_id: i32) -> AppResult<bool> {
        let count = SavedEvent::find()
            .filter(saved_event::Column::UserId.eq(user_id))
            .filter(saved_event::Column::EventId.eq(event_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(count > 0)
    }

    /// Events the user has saved, soonest first.
    pub async fn list_events_for_user(&self, user_id: i32) -> AppResult<Vec<event::Model>> {
        Event::find()
            .join(JoinType::InnerJoin, event::Relation::SavedBy.def())
            .filter(saved_event::Column::UserId.eq(user_id))
            .order_by_asc(event::Column::StartsAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Telegram IDs of everyone who saved the event (broadcast recipients).
    pub async fn subscriber_telegram_ids(&self, event_id: i32) -> AppResult<Vec<i64>> {
        User::find()
            .join(JoinType::InnerJoin, user::Relation::SavedEvents.def())
            .filter(saved_event::Column::EventId.eq(event_id))
            .select_only()
            .column(user::Column::TelegramId)
            .into_tuple::<i64>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
