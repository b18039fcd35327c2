//! Reminder service.
//!
//! A polling sweeper, not an event-driven scheduler: every tick it picks
//! up the due, unsent reminders, pushes notifications through the
//! [`Notifier`](crate::services::notifier::Notifier) seam and flips the
//! monotonic `sent` flag. Delivery is fire-and-forget — a failed send is
//! logged, never retried, and never holds the flag back.

use afisha_common::AppResult;
use afisha_db::{
    entities::{event, reminder},
    repositories::{EventRepository, ReminderRepository, SavedEventRepository, UserRepository},
};
use chrono::{DateTime, Utc};

use crate::services::notifier::SharedNotifier;

/// Reminder sweeper service.
#[derive(Clone)]
pub struct ReminderService {
    reminder_repo: ReminderRepository,
    event_repo: EventRepository,
    saved_repo: SavedEventRepository,
    user_repo: UserRepository,
    notifier: SharedNotifier,
}

impl ReminderService {
    /// Create a new reminder service.
    #[must_use]
    pub fn new(
        reminder_repo: ReminderRepository,
        event_repo: EventRepository,
        saved_repo: SavedEventRepository,
        user_repo: UserRepository,
        notifier: SharedNotifier,
    ) -> Self {
        Self {
            reminder_repo,
            event_repo,
            saved_repo,
            user_repo,
            notifier,
        }
    }

    /// Process all reminders due at `now`. Returns how many were handled.
    ///
    /// Safe to re-run immediately: `sent` reminders are never picked up
    /// again.
    pub async fn sweep(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let due = self.reminder_repo.find_due(now).await?;
        let mut processed = 0;

        for reminder in due {
            self.fire(&reminder).await;
            self.reminder_repo.mark_sent(reminder.id).await?;
            processed += 1;
        }

        Ok(processed)
    }

    /// Notify the reminder's recipients. Errors are logged only.
    async fn fire(&self, reminder: &reminder::Model) {
        let event = match self.event_repo.find_by_id(reminder.event_id).await {
            Ok(Some(event)) => event,
            Ok(None) => {
                tracing::warn!(
                    reminder_id = reminder.id,
                    event_id = reminder.event_id,
                    "Reminder points at a missing event"
                );
                return;
            }
            Err(e) => {
                tracing::warn!(reminder_id = reminder.id, error = %e, "Failed to load event");
                return;
            }
        };

        let recipients = match self.recipients(reminder).await {
            Ok(recipients) => recipients,
            Err(e) => {
                tracing::warn!(reminder_id = reminder.id, error = %e, "Failed to resolve recipients");
                return;
            }
        };

        let text = reminder_text(&event);
        for chat_id in recipients {
            if let Err(e) = self.notifier.send_message(chat_id, &text).await {
                tracing::warn!(chat_id, reminder_id = reminder.id, error = %e, "Failed to send reminder");
            }
        }
    }

    /// Chat IDs to notify: the targeted user, or every subscriber of the
    /// event for a broadcast reminder.
    async fn recipients(&self, reminder: &reminder::Model) -> AppResult<Vec<i64>> {
        match reminder.user_id {
            Some(user_id) => Ok(self
                .user_repo
                .find_by_id(user_id)
                .await?
                .map(|user| vec![user.telegram_id])
                .unwrap_or_default()),
            None => self.saved_repo.subscriber_telegram_ids(reminder.event_id).await,
        }
    }
}

fn reminder_text(event: &event::Model) -> String {
    let starts = DateTime::<Utc>::from(event.starts_at).format("%Y-%m-%d %H:%M UTC");
    match &event.location {
        Some(location) => format!("Reminder: {} starts at {starts} ({location})", event.title),
        None => format!("Reminder: {} starts at {starts}", event.title),
    }
}
