//! Poll and vote repositories.
//!
//! Vote casting and poll creation/editing are the multi-statement
//! mutations of this schema; each runs inside a single transaction so a
//! failure rolls back the whole step and `votes_count` never drifts from
//! the vote rows.

use std::collections::HashMap;
use std::sync::Arc;

use crate::entities::{Poll, PollOption, Vote, poll, poll_option, vote};
use afisha_common::{AppError, AppResult};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, SqlErr, TransactionTrait,
};

/// Poll repository for database operations.
#[derive(Clone)]
pub struct PollRepository {
    db: Arc<DatabaseConnection>,
}

impl PollRepository {
    /// Create a new poll repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a poll by ID.
    pub async fn find_by_id(&self, id: i32) -> AppResult<Option<poll::Model>> {
        Poll::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a poll by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: i32) -> AppResult<poll::Model> {
        self.find_by_id(id).await?.ok_or(AppError::PollNotFound(id))
    }

    /// Polls still open at `now`, closing soonest first.
    pub async fn list_active(&self, now: DateTime<Utc>) -> AppResult<Vec<poll::Model>> {
        Poll::find()
            .filter(poll::Column::EndsAt.gte(now))
            .order_by_asc(poll::Column::EndsAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// All polls ordered by end date (admin view).
    pub async fn list_all(&self) -> AppResult<Vec<poll::Model>> {
        Poll::find()
            .order_by_asc(poll::Column::EndsAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Options of a poll in display order.
    pub async fn options_for(&self, poll_id: i32) -> AppResult<Vec<poll_option::Model>> {
        PollOption::find()
            .filter(poll_option::Column::PollId.eq(poll_id))
            .order_by_asc(poll_option::Column::Position)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a poll together with its options.
    ///
    /// Both land in one transaction: a poll row without options is a bug,
    /// not a degradation.
    pub async fn create_with_options(
        &self,
        model: poll::ActiveModel,
        texts: &[String],
    ) -> AppResult<(poll::Model, Vec<poll_option::Model>)> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let created = model
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut options = Vec::with_capacity(texts.len());
        for (position, text) in texts.iter().enumerate() {
            let option = poll_option::ActiveModel {
                poll_id: Set(created.id),
                position: Set(position as i32),
                text: Set(text.clone()),
                votes_count: Set(0),
                ..Default::default()
            };
            options.push(
                option
                    .insert(&txn)
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?,
            );
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok((created, options))
    }

    /// Replace a poll's metadata and option list.
    ///
    /// Options are matched to the existing rows by identical text: matches
    /// keep their row (and therefore their votes and counter), new texts
    /// start at zero, and removed options are deleted with their votes
    /// cascading away.
    pub async fn update_with_options(
        &self,
        poll_id: i32,
        model: poll::ActiveModel,
        texts: &[String],
    ) -> AppResult<(poll::Model, Vec<poll_option::Model>)> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let existing = Poll::find_by_id(poll_id)
            .one(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or(AppError::PollNotFound(poll_id))?;

        let mut model = model;
        model.id = Set(existing.id);
        let updated = model
            .update(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let current = PollOption::find()
            .filter(poll_option::Column::PollId.eq(poll_id))
            .all(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut by_text: HashMap<String, poll_option::Model> = current
            .into_iter()
            .map(|option| (option.text.clone(), option))
            .collect();

        for (position, text) in texts.iter().enumerate() {
            let position = position as i32;
            match by_text.remove(text) {
                Some(kept) if kept.position == position => {}
                Some(kept) => {
                    let mut active: poll_option::ActiveModel = kept.into();
                    active.position = Set(position);
                    active
                        .update(&txn)
                        .await
                        .map_err(|e| AppError::Database(e.to_string()))?;
                }
                None => {
                    let option = poll_option::ActiveModel {
                        poll_id: Set(poll_id),
                        position: Set(position),
                        text: Set(text.clone()),
                        votes_count: Set(0),
                        ..Default::default()
                    };
                    option
                        .insert(&txn)
                        .await
                        .map_err(|e| AppError::Database(e.to_string()))?;
                }
            }
        }

        // Whatever was not matched by text is gone; its votes cascade.
        for removed in by_text.into_values() {
            PollOption::delete_by_id(removed.id)
                .exec(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }

        let options = PollOption::find()
            .filter(poll_option::Column::PollId.eq(poll_id))
            .order_by_asc(poll_option::Column::Position)
            .all(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok((updated, options))
    }

    /// Delete a poll. Options and votes cascade at the database level.
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        Poll::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Total poll count.
    pub async fn count(&self) -> AppResult<u64> {
        Poll::find()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Polls still open at `now`.
    pub async fn count_active(&self, now: DateTime<Utc>) -> AppResult<u64> {
        Poll::find()
            .filter(poll::Column::EndsAt.gte(now))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Polls already closed at `now`.
    pub async fn count_ended(&self, now: DateTime<Utc>) -> AppResult<u64> {
        Poll::find()
            .filter(poll::Column::EndsAt.lt(now))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

/// Vote repository for database operations.
#[derive(Clone)]
pub struct VoteRepository {
    db: Arc<DatabaseConnection>,
}

impl VoteRepository {
    /// Create a new vote repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a user's vote on a poll.
    pub async fn find_by_poll_and_user(
        &self,
        poll_id: i32,
        user_id: i32,
    ) -> AppResult<Option<vote::Model>> {
        Vote::find()
            .filter(vote::Column::PollId.eq(poll_id))
            .filter(vote::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Whether the user has voted on the poll.
    pub async fn has_voted(&self, poll_id: i32, user_id: i32) -> AppResult<bool> {
        Ok(self.find_by_poll_and_user(poll_id, user_id).await?.is_some())
    }

    /// Record a vote and bump the option counter in one transaction.
    ///
    /// The insert hits the unique (`poll_id`, `user_id`) index; losing that
    /// race surfaces as `AlreadyVoted` and nothing is committed. The
    /// counter bump is a single relative UPDATE, so concurrent votes for
    /// different users never clobber each other's increment.
    pub async fn cast(&self, poll_id: i32, user_id: i32, option_id: i32) -> AppResult<vote::Model> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let created = insert_vote(&txn, poll_id, user_id, option_id).await?;

        PollOption::update_many()
            .col_expr(
                poll_option::Column::VotesCount,
                Expr::col(poll_option::Column::VotesCount).add(1),
            )
            .filter(poll_option::Column::Id.eq(option_id))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(created)
    }

    /// Number of votes cast on a poll.
    pub async fn count_for_poll(&self, poll_id: i32) -> AppResult<u64> {
        Vote::find()
            .filter(vote::Column::PollId.eq(poll_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Total number of votes across all polls.
    pub async fn count_all(&self) -> AppResult<u64> {
        Vote::find()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

async fn insert_vote(
    txn: &DatabaseTransaction,
    poll_id: i32,
    user_id: i32,
    option_id: i32,
) -> AppResult<vote::Model> {
    let model = vote::ActiveModel {
        poll_id: Set(poll_id),
        user_id: Set(user_id),
        option_id: Set(option_id),
        created_at: Set(Utc::now().into()),
        ..Default::default()
    };

    model.insert(txn).await.map_err(|e| {
        if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
            AppError::AlreadyVoted
        } else {
            AppError::Database(e.to_string())
        }
    })
}
