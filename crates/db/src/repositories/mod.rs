//! Database repositories.

pub mod event;
pub mod poll;
pub mod reminder;
pub mod saved_event;
pub mod user;

pub use event::{EventFilter, EventRepository, EventScope};
pub use poll::{PollRepository, VoteRepository};
pub use reminder::ReminderRepository;
pub use saved_event::SavedEventRepository;
pub use user::UserRepository;
