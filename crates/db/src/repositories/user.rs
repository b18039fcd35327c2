//! User repository.

use std::sync::Arc;

use crate::entities::{User, user};
use afisha_common::{AppError, AppResult};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, SqlErr,
};

/// User repository for database operations.
#[derive(Clone)]
pub struct UserRepository {
    db: Arc<DatabaseConnection>,
}

impl UserRepository {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a user by Telegram ID.
    pub async fn find_by_telegram_id(&self, telegram_id: i64) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::TelegramId.eq(telegram_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a user by Telegram ID, returning an error if not found.
    pub async fn get_by_telegram_id(&self, telegram_id: i64) -> AppResult<user::Model> {
        self.find_by_telegram_id(telegram_id)
            .await?
            .ok_or_else(|| AppError::UserNotFound(telegram_id.to_string()))
    }

    /// Find a user by internal ID.
    pub async fn find_by_id(&self, id: i32) -> AppResult<Option<user::Model>> {
        User::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new user.
    ///
    /// A concurrent first-contact for the same Telegram ID loses the race
    /// on the unique index; that surfaces as `Conflict` so the caller can
    /// fall back to a lookup.
    pub async fn create(&self, model: user::ActiveModel) -> AppResult<user::Model> {
        model.insert(self.db.as_ref()).await.map_err(|e| {
            if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                AppError::Conflict("User already exists".to_string())
            } else {
                AppError::Database(e.to_string())
            }
        })
    }

    /// Update a user.
    pub async fn update(&self, model: user::ActiveModel) -> AppResult<user::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Set the admin flag (single UPDATE, no fetch).
    pub async fn set_admin(&self, user_id: i32, is_admin: bool) -> AppResult<()> {
        User::update_many()
            .col_expr(user::Column::IsAdmin, Expr::value(is_admin))
            .filter(user::Column::Id.eq(user_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Stamp `last_active_at` with the current time (single UPDATE, no fetch).
    pub async fn touch_last_active(&self, telegram_id: i64) -> AppResult<()> {
        User::update_many()
            .col_expr(user::Column::LastActiveAt, Expr::current_timestamp().into())
            .filter(user::Column::TelegramId.eq(telegram_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// All users, most recently active first.
    pub async fn list_by_last_active(&self) -> AppResult<Vec<user::Model>> {
        User::find()
            .order_by_desc(user::Column::LastActiveAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Total user count.
    pub async fn count(&self) -> AppResult<u64> {
        User::find()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Users active since the given instant.
    pub async fn count_active_since(&self, since: DateTime<Utc>) -> AppResult<u64> {
        User::find()
            .filter(user::Column::LastActiveAt.gte(since))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Users created since the given instant.
    pub async fn count_created_since(&self, since: DateTime<Utc>) -> AppResult<u64> {
        User::find()
            .filter(user::Column::CreatedAt.gte(since))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
