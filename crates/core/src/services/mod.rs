//! Business logic services.

#![allow(missing_docs)]

pub mod event;
pub mod notifier;
pub mod poll;
pub mod reminder;
pub mod stats;
pub mod user;

pub use event::{CreateEventInput, EventService, UpdateEventInput};
pub use notifier::{NoopNotifier, Notifier, SharedNotifier};
pub use poll::{CreatePollInput, PollService, PollTallyEntry, PollView, UpdatePollInput};
pub use reminder::ReminderService;
pub use stats::{StatsOverview, StatsService, UserActivity};
pub use user::UserService;
