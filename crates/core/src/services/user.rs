//! User service.
//!
//! Maps verified Telegram identities onto user rows and handles bearer
//! token authentication for the HTTP API.

use afisha_common::{AppError, AppResult, JwtService};
use afisha_db::{entities::user, repositories::UserRepository};
use chrono::Utc;
use sea_orm::Set;

/// User service for business logic.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    jwt: JwtService,
    admin_ids: Vec<i64>,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub fn new(user_repo: UserRepository, jwt: JwtService, admin_ids: Vec<i64>) -> Self {
        Self {
            user_repo,
            jwt,
            admin_ids,
        }
    }

    /// Whether the Telegram ID is on the admin allowlist.
    #[must_use]
    pub fn is_admin_id(&self, telegram_id: i64) -> bool {
        self.admin_ids.contains(&telegram_id)
    }

    /// Resolve a verified Telegram identity to a user row, creating one
    /// on first contact.
    ///
    /// Existing users get their activity stamped (best-effort) and their
    /// admin flag re-derived from the allowlist. Two concurrent first
    /// contacts race on the unique `telegram_id` index; the loser falls
    /// back to the lookup, so exactly one row exists either way.
    pub async fn resolve(
        &self,
        telegram_id: i64,
        username: Option<&str>,
    ) -> AppResult<user::Model> {
        let is_admin = self.is_admin_id(telegram_id);

        if let Some(existing) = self.user_repo.find_by_telegram_id(telegram_id).await? {
            if let Err(e) = self.user_repo.touch_last_active(telegram_id).await {
                tracing::warn!(telegram_id, error = %e, "Failed to update last_active_at");
            }

            // The allowlist is the only source of truth for the flag.
            if existing.is_admin != is_admin {
                self.user_repo.set_admin(existing.id, is_admin).await?;
                return Ok(user::Model {
                    is_admin,
                    ..existing
                });
            }
            return Ok(existing);
        }

        let now = Utc::now();
        let model = user::ActiveModel {
            telegram_id: Set(telegram_id),
            username: Set(username.map(ToOwned::to_owned)),
            is_admin: Set(is_admin),
            created_at: Set(now.into()),
            last_active_at: Set(now.into()),
            ..Default::default()
        };

        match self.user_repo.create(model).await {
            Ok(created) => {
                tracing::info!(telegram_id, "Created new user");
                Ok(created)
            }
            // Lost a concurrent first-contact race: the row exists now.
            Err(AppError::Conflict(_)) => self.user_repo.get_by_telegram_id(telegram_id).await,
            Err(e) => Err(e),
        }
    }

    /// Issue a bearer token for a resolved user.
    pub fn issue_token(&self, telegram_id: i64) -> AppResult<String> {
        self.jwt.issue(telegram_id)
    }

    /// Authenticate a bearer token and load the corresponding user.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<user::Model> {
        let claims = self.jwt.verify(token)?;
        let telegram_id = claims.telegram_id()?;
        self.user_repo
            .find_by_telegram_id(telegram_id)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    /// Best-effort activity stamp; failures are logged, never propagated.
    pub async fn touch(&self, telegram_id: i64) {
        if let Err(e) = self.user_repo.touch_last_active(telegram_id).await {
            tracing::warn!(telegram_id, error = %e, "Failed to update last_active_at");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn test_user(id: i32, telegram_id: i64, is_admin: bool) -> user::Model {
        let now = Utc::now();
        user::Model {
            id,
            telegram_id,
            username: Some("tester".to_string()),
            is_admin,
            created_at: now.into(),
            last_active_at: now.into(),
        }
    }

    fn service(db: sea_orm::DatabaseConnection, admin_ids: Vec<i64>) -> UserService {
        UserService::new(
            UserRepository::new(Arc::new(db)),
            JwtService::new("test-secret-key-that-is-long-enough", 900),
            admin_ids,
        )
    }

    #[tokio::test]
    async fn resolve_returns_existing_user() {
        let existing = test_user(1, 42, false);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[existing.clone()]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        let service = service(db, vec![]);
        let resolved = service.resolve(42, Some("tester")).await.unwrap();
        assert_eq!(resolved.id, 1);
        assert!(!resolved.is_admin);
    }

    #[tokio::test]
    async fn resolve_reapplies_allowlist() {
        // User exists with is_admin=false but is now on the allowlist.
        let existing = test_user(1, 42, false);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[existing]])
            .append_exec_results([
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
            ])
            .into_connection();

        let service = service(db, vec![42]);
        let resolved = service.resolve(42, None).await.unwrap();
        assert!(resolved.is_admin);
    }

    #[tokio::test]
    async fn resolve_creates_on_first_contact() {
        let created = test_user(7, 99, false);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            // Lookup finds nothing, insert returns the new row.
            .append_query_results([Vec::<user::Model>::new(), vec![created]])
            .into_connection();

        let service = service(db, vec![]);
        let resolved = service.resolve(99, Some("tester")).await.unwrap();
        assert_eq!(resolved.id, 7);
        assert_eq!(resolved.telegram_id, 99);
    }

    #[tokio::test]
    async fn authenticate_by_token_round_trip() {
        let user = test_user(1, 42, false);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[user]])
            .into_connection();

        let service = service(db, vec![]);
        let token = service.issue_token(42).unwrap();
        let authenticated = service.authenticate_by_token(&token).await.unwrap();
        assert_eq!(authenticated.telegram_id, 42);
    }

    #[tokio::test]
    async fn authenticate_unknown_user_fails() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user::Model>::new()])
            .into_connection();

        let service = service(db, vec![]);
        let token = service.issue_token(42).unwrap();
        assert!(matches!(
            service.authenticate_by_token(&token).await,
            Err(AppError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn authenticate_garbage_token_fails() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let service = service(db, vec![]);
        assert!(matches!(
            service.authenticate_by_token("junk").await,
            Err(AppError::Unauthorized)
        ));
    }
}
