//! Event repository.

use std::sync::Arc;

use crate::entities::{Event, event};
use afisha_common::{AppError, AppResult};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Condition, Expr, extension::postgres::PgExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};

/// Whether a listing targets upcoming or past events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventScope {
    #[default]
    Upcoming,
    Past,
}

/// Filters for the event listing.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub scope: EventScope,
    pub category: Option<String>,
    /// Calendar month of `starts_at`, 1-12.
    pub month: Option<u32>,
    /// Case-insensitive substring across title, description and location.
    pub search: Option<String>,
}

/// Event repository for database operations.
#[derive(Clone)]
pub struct EventRepository {
    db: Arc<DatabaseConnection>,
}

impl EventRepository {
    /// Create a new event repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an event by ID.
    pub async fn find_by_id(&self, id: i32) -> AppResult<Option<event::Model>> {
        Event::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get an event by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: i32) -> AppResult<event::Model> {
        self.find_by_id(id).await?.ok_or(AppError::EventNotFound(id))
    }

    /// List events matching the filter, relative to `now`.
    ///
    /// Upcoming events sort soonest-first, past events most-recent-first.
    pub async fn list(&self, filter: &EventFilter, now: DateTime<Utc>) -> AppResult<Vec<event::Model>> {
        let mut query = match filter.scope {
            EventScope::Upcoming => Event::find()
                .filter(event::Column::StartsAt.gte(now))
                .order_by_asc(event::Column::StartsAt),
            EventScope::Past => Event::find()
                .filter(event::Column::StartsAt.lt(now))
                .order_by_desc(event::Column::StartsAt),
        };

        if let Some(category) = &filter.category {
            query = query.filter(event::Column::Category.eq(category));
        }

        if let Some(month) = filter.month {
            query = query.filter(Expr::cust_with_values(
                "EXTRACT(MONTH FROM starts_at) = ?",
                [i32::try_from(month).unwrap_or(0)],
            ));
        }

        if let Some(search) = &filter.search {
            let pattern = format!("%{}%", escape_like(search));
            query = query.filter(
                Condition::any()
                    .add(Expr::col(event::Column::Title).ilike(pattern.clone()))
                    .add(Expr::col(event::Column::Description).ilike(pattern.clone()))
                    .add(Expr::col(event::Column::Location).ilike(pattern)),
            );
        }

        query
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// All events ordered by start time (admin view).
    pub async fn list_all(&self) -> AppResult<Vec<event::Model>> {
        Event::find()
            .order_by_asc(event::Column::StartsAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new event.
    pub async fn create(&self, model: event::ActiveModel) -> AppResult<event::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update an event.
    pub async fn update(&self, model: event::ActiveModel) -> AppResult<event::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete an event. Saved rows and reminders cascade.
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        Event::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Total event count.
    pub async fn count(&self) -> AppResult<u64> {
        Event::find()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Events starting at or after `now`.
    pub async fn count_upcoming(&self, now: DateTime<Utc>) -> AppResult<u64> {
        Event::find()
            .filter(event::Column::StartsAt.gte(now))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Events that already started before `now`.
    pub async fn count_past(&self, now: DateTime<Utc>) -> AppResult<u64> {
        Event::find()
            .filter(event::Column::StartsAt.lt(now))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Event counts grouped by category.
    pub async fn count_by_category(&self) -> AppResult<Vec<(String, i64)>> {
        Event::find()
            .select_only()
            .column(event::Column::Category)
            .column_as(event::Column::Id.count(), "count")
            .group_by(event::Column::Category)
            .into_tuple::<(String, i64)>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

/// Escape LIKE wildcards in user-supplied search text.
fn escape_like(input: &str) -> String {
    input.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_like_neutralizes_wildcards() {
        assert_eq!(escape_like("100%_done"), "100\\%\\_done");
        assert_eq!(escape_like("plain"), "plain");
    }
}
