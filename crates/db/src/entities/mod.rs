//! Database entities.

pub mod event;
pub mod poll;
pub mod poll_option;
pub mod reminder;
pub mod saved_event;
pub mod user;
pub mod vote;

pub use event::Entity as Event;
pub use poll::Entity as Poll;
pub use poll_option::Entity as PollOption;
pub use reminder::Entity as Reminder;
pub use saved_event::Entity as SavedEvent;
pub use user::Entity as User;
pub use vote::Entity as Vote;
