//! Aggregate statistics for the admin dashboard.

use afisha_common::AppResult;
use afisha_db::repositories::{EventRepository, PollRepository, UserRepository, VoteRepository};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// A user is shown as "active" if seen within this window.
const ACTIVE_WINDOW_SECS: i64 = 300;

/// Stats service for the admin dashboard.
#[derive(Clone)]
pub struct StatsService {
    user_repo: UserRepository,
    event_repo: EventRepository,
    poll_repo: PollRepository,
    vote_repo: VoteRepository,
}

/// Dashboard aggregate counts.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsOverview {
    pub events: EventStats,
    pub polls: PollStats,
    pub users: UserStats,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventStats {
    pub total: u64,
    pub upcoming: u64,
    pub past: u64,
    pub by_category: Vec<CategoryCount>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCount {
    pub category: String,
    pub count: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollStats {
    pub total: u64,
    pub active: u64,
    pub completed: u64,
    pub total_votes: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total: u64,
    pub active_today: u64,
    pub new_this_week: u64,
}

/// One row of the admin user-activity listing.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserActivity {
    pub id: i64,
    pub username: Option<String>,
    pub last_active: String,
    pub is_active: bool,
}

impl StatsService {
    /// Create a new stats service.
    #[must_use]
    pub const fn new(
        user_repo: UserRepository,
        event_repo: EventRepository,
        poll_repo: PollRepository,
        vote_repo: VoteRepository,
    ) -> Self {
        Self {
            user_repo,
            event_repo,
            poll_repo,
            vote_repo,
        }
    }

    /// Aggregate counts across events, polls and users.
    pub async fn overview(&self) -> AppResult<StatsOverview> {
        let now = Utc::now();

        let by_category = self
            .event_repo
            .count_by_category()
            .await?
            .into_iter()
            .map(|(category, count)| CategoryCount { category, count })
            .collect();

        Ok(StatsOverview {
            events: EventStats {
                total: self.event_repo.count().await?,
                upcoming: self.event_repo.count_upcoming(now).await?,
                past: self.event_repo.count_past(now).await?,
                by_category,
            },
            polls: PollStats {
                total: self.poll_repo.count().await?,
                active: self.poll_repo.count_active(now).await?,
                completed: self.poll_repo.count_ended(now).await?,
                total_votes: self.vote_repo.count_all().await?,
            },
            users: UserStats {
                total: self.user_repo.count().await?,
                active_today: self.user_repo.count_active_since(now - Duration::days(1)).await?,
                new_this_week: self
                    .user_repo
                    .count_created_since(now - Duration::days(7))
                    .await?,
            },
        })
    }

    /// Users ordered by recency, flagged active within the last 5 minutes.
    pub async fn list_users(&self) -> AppResult<Vec<UserActivity>> {
        let now = Utc::now();
        let users = self.user_repo.list_by_last_active().await?;

        Ok(users
            .into_iter()
            .map(|user| {
                let last_active = DateTime::<Utc>::from(user.last_active_at);
                UserActivity {
                    id: user.telegram_id,
                    username: user.username,
                    last_active: last_active.to_rfc3339(),
                    is_active: (now - last_active).num_seconds() < ACTIVE_WINDOW_SECS,
                }
            })
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use afisha_db::entities::user;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    #[tokio::test]
    async fn list_users_flags_recent_activity() {
        let now = Utc::now();
        let active = user::Model {
            id: 1,
            telegram_id: 11,
            username: Some("fresh".to_string()),
            is_admin: false,
            created_at: now.into(),
            last_active_at: now.into(),
        };
        let idle = user::Model {
            id: 2,
            telegram_id: 22,
            username: None,
            is_admin: false,
            created_at: now.into(),
            last_active_at: (now - Duration::hours(2)).into(),
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![active, idle]])
                .into_connection(),
        );

        let service = StatsService::new(
            UserRepository::new(Arc::clone(&db)),
            EventRepository::new(Arc::clone(&db)),
            PollRepository::new(Arc::clone(&db)),
            VoteRepository::new(db),
        );

        let users = service.list_users().await.unwrap();
        assert_eq!(users.len(), 2);
        assert!(users[0].is_active);
        assert!(!users[1].is_active);
    }
}
