//! Reminder repository.

use std::sync::Arc;

use crate::entities::{Reminder, reminder};
use afisha_common::{AppError, AppResult};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

/// Reminder repository for database operations.
#[derive(Clone)]
pub struct ReminderRepository {
    db: Arc<DatabaseConnection>,
}

impl ReminderRepository {
    /// Create a new reminder repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Schedule a reminder. `user_id` of `None` means broadcast.
    pub async fn create(
        &self,
        event_id: i32,
        user_id: Option<i32>,
        remind_at: DateTime<Utc>,
    ) -> AppResult<reminder::Model> {
        let model = reminder::ActiveModel {
            event_id: Set(event_id),
            user_id: Set(user_id),
            remind_at: Set(remind_at.into()),
            sent: Set(false),
            ..Default::default()
        };

        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Due, unsent reminders as of `now`, oldest first.
    pub async fn find_due(&self, now: DateTime<Utc>) -> AppResult<Vec<reminder::Model>> {
        Reminder::find()
            .filter(reminder::Column::Sent.eq(false))
            .filter(reminder::Column::RemindAt.lte(now))
            .order_by_asc(reminder::Column::RemindAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Flip the monotonic `sent` flag (single UPDATE, no fetch).
    pub async fn mark_sent(&self, id: i32) -> AppResult<()> {
        Reminder::update_many()
            .col_expr(reminder::Column::Sent, Expr::value(true))
            .filter(reminder::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
