//! Background jobs for afisha.
//!
//! The only periodic work is the reminder sweep; it runs on a plain
//! tokio interval, not a job queue. The Telegram notifier lives here so
//! the core stays free of HTTP concerns.

pub mod scheduler;
pub mod telegram;

pub use scheduler::{SchedulerConfig, run_scheduler};
pub use telegram::TelegramNotifier;
