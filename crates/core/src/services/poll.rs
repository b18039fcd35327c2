//! Poll service.
//!
//! Owns poll definitions, the one-vote-per-user rule and tallying. Vote
//! casting checks its preconditions in a fixed order — existence, open
//! window, no prior vote, option bounds — and the first failure decides
//! the error. The application-level "no prior vote" check only produces
//! the friendly error; the unique index behind [`VoteRepository::cast`]
//! is what actually guarantees the rule under concurrency.

use afisha_common::{AppError, AppResult};
use afisha_db::{
    entities::{poll, poll_option},
    repositories::{PollRepository, VoteRepository},
};
use chrono::{DateTime, Utc};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

/// Poll service for business logic.
#[derive(Clone)]
pub struct PollService {
    poll_repo: PollRepository,
    vote_repo: VoteRepository,
}

/// Input for creating a poll.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePollInput {
    #[validate(length(min = 1, max = 256))]
    pub title: String,

    pub description: Option<String>,

    pub ends_at: DateTime<Utc>,

    /// Option texts in display order.
    pub options: Vec<String>,
}

/// Input for updating a poll. The admin form always submits the full
/// definition; options are matched to existing ones by identical text.
pub type UpdatePollInput = CreatePollInput;

/// A poll with its options and the caller's vote, if any.
#[derive(Debug, Clone)]
pub struct PollView {
    pub poll: poll::Model,
    pub options: Vec<poll_option::Model>,
    /// Position of the option the user voted for.
    pub user_vote: Option<i32>,
    pub is_closed: bool,
}

/// One row of a poll tally.
#[derive(Debug, Clone, PartialEq)]
pub struct PollTallyEntry {
    pub text: String,
    pub votes: i32,
    pub percentage: f64,
}

impl PollService {
    /// Create a new poll service.
    #[must_use]
    pub const fn new(poll_repo: PollRepository, vote_repo: VoteRepository) -> Self {
        Self {
            poll_repo,
            vote_repo,
        }
    }

    /// Create a poll with its options (admin action).
    pub async fn create(&self, input: CreatePollInput, created_by: i32) -> AppResult<PollView> {
        input.validate()?;
        validate_options(&input.options)?;
        if input.ends_at <= Utc::now() {
            return Err(AppError::Validation(
                "Poll end date must be in the future".to_string(),
            ));
        }

        let model = poll::ActiveModel {
            title: Set(input.title),
            description: Set(input.description),
            ends_at: Set(input.ends_at.into()),
            created_by: Set(Some(created_by)),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };

        let (created, options) = self
            .poll_repo
            .create_with_options(model, &input.options)
            .await?;

        Ok(PollView {
            is_closed: false,
            poll: created,
            options,
            user_vote: None,
        })
    }

    /// Update a poll (admin action).
    ///
    /// Options matched by identical text keep their votes; new texts start
    /// at zero; removed options lose theirs. Closing a poll by moving
    /// `ends_at` into the past is allowed.
    pub async fn update(&self, poll_id: i32, input: UpdatePollInput) -> AppResult<PollView> {
        input.validate()?;
        validate_options(&input.options)?;

        let model = poll::ActiveModel {
            title: Set(input.title),
            description: Set(input.description),
            ends_at: Set(input.ends_at.into()),
            ..Default::default()
        };

        let (updated, options) = self
            .poll_repo
            .update_with_options(poll_id, model, &input.options)
            .await?;

        Ok(PollView {
            is_closed: DateTime::<Utc>::from(updated.ends_at) < Utc::now(),
            poll: updated,
            options,
            user_vote: None,
        })
    }

    /// Delete a poll (admin action). Options and votes cascade.
    pub async fn delete(&self, poll_id: i32) -> AppResult<()> {
        self.poll_repo.get_by_id(poll_id).await?;
        self.poll_repo.delete(poll_id).await
    }

    /// Get a single poll with options and the caller's vote.
    pub async fn get(&self, poll_id: i32, user_id: Option<i32>) -> AppResult<PollView> {
        let poll = self.poll_repo.get_by_id(poll_id).await?;
        self.view_for(poll, user_id).await
    }

    /// Polls still open, each with the caller's voted state.
    pub async fn list_active(&self, user_id: Option<i32>) -> AppResult<Vec<PollView>> {
        let polls = self.poll_repo.list_active(Utc::now()).await?;
        let mut views = Vec::with_capacity(polls.len());
        for poll in polls {
            views.push(self.view_for(poll, user_id).await?);
        }
        Ok(views)
    }

    /// Every poll, for the admin panel.
    pub async fn list_all(&self) -> AppResult<Vec<PollView>> {
        let polls = self.poll_repo.list_all().await?;
        let mut views = Vec::with_capacity(polls.len());
        for poll in polls {
            views.push(self.view_for(poll, None).await?);
        }
        Ok(views)
    }

    /// Cast a vote. Preconditions in order; the first failure decides the
    /// error and nothing is written.
    pub async fn cast_vote(&self, poll_id: i32, user_id: i32, option_index: i32) -> AppResult<()> {
        // 1. Poll exists.
        let poll = self
            .poll_repo
            .find_by_id(poll_id)
            .await?
            .ok_or(AppError::PollNotFound(poll_id))?;

        // 2. Voting window still open.
        if DateTime::<Utc>::from(poll.ends_at) <= Utc::now() {
            return Err(AppError::PollClosed);
        }

        // 3. No prior vote (friendly pre-check; the unique index decides).
        if self.vote_repo.has_voted(poll_id, user_id).await? {
            return Err(AppError::AlreadyVoted);
        }

        // 4. Option index within bounds.
        let options = self.poll_repo.options_for(poll_id).await?;
        let option = options
            .iter()
            .find(|option| option.position == option_index)
            .ok_or(AppError::InvalidOption(option_index))?;

        self.vote_repo.cast(poll_id, user_id, option.id).await?;
        Ok(())
    }

    /// Tally for a poll, in option order.
    pub async fn tally(&self, poll_id: i32) -> AppResult<Vec<PollTallyEntry>> {
        self.poll_repo.get_by_id(poll_id).await?;
        let options = self.poll_repo.options_for(poll_id).await?;
        Ok(tally_options(&options))
    }

    async fn view_for(&self, poll: poll::Model, user_id: Option<i32>) -> AppResult<PollView> {
        let options = self.poll_repo.options_for(poll.id).await?;

        let user_vote = match user_id {
            Some(uid) => self
                .vote_repo
                .find_by_poll_and_user(poll.id, uid)
                .await?
                .and_then(|vote| {
                    options
                        .iter()
                        .find(|option| option.id == vote.option_id)
                        .map(|option| option.position)
                }),
            None => None,
        };

        Ok(PollView {
            is_closed: DateTime::<Utc>::from(poll.ends_at) < Utc::now(),
            poll,
            options,
            user_vote,
        })
    }
}

/// Compute a tally from option rows. Percentage is share of all votes on
/// the poll, 0 when nobody voted yet.
#[must_use]
pub fn tally_options(options: &[poll_option::Model]) -> Vec<PollTallyEntry> {
    let total: i64 = options.iter().map(|option| i64::from(option.votes_count)).sum();
    options
        .iter()
        .map(|option| PollTallyEntry {
            text: option.text.clone(),
            votes: option.votes_count,
            percentage: if total == 0 {
                0.0
            } else {
                f64::from(option.votes_count) / total as f64 * 100.0
            },
        })
        .collect()
}

fn validate_options(options: &[String]) -> AppResult<()> {
    if options.is_empty() {
        return Err(AppError::Validation(
            "Poll must have at least one option".to_string(),
        ));
    }
    for text in options {
        if text.trim().is_empty() {
            return Err(AppError::Validation(
                "Poll options cannot be empty".to_string(),
            ));
        }
        if text.len() > 256 {
            return Err(AppError::Validation(
                "Poll option is too long (max 256 chars)".to_string(),
            ));
        }
    }
    // Votes are carried across edits by matching option text, so texts
    // must be distinct within a poll.
    let mut seen = std::collections::HashSet::new();
    for text in options {
        if !seen.insert(text.as_str()) {
            return Err(AppError::Validation(
                "Poll options must be unique".to_string(),
            ));
        }
    }
    Ok(())
}
