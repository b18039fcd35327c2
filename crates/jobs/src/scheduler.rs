//! Scheduled jobs for periodic maintenance tasks.

use std::time::Duration;

use afisha_core::ReminderService;
use chrono::Utc;
use tokio::time::interval;

/// Scheduler configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Interval between reminder sweeps (default: 1 minute).
    pub reminder_sweep_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            reminder_sweep_interval: Duration::from_secs(60),
        }
    }
}

/// Spawn the periodic jobs. The sweep interval is owned by the caller's
/// configuration, not by the sweeper itself.
pub fn run_scheduler(config: SchedulerConfig, reminder_service: ReminderService) {
    let sweep_interval = config.reminder_sweep_interval;

    tokio::spawn(async move {
        let mut interval = interval(sweep_interval);
        loop {
            interval.tick().await;
            match reminder_service.sweep(Utc::now()).await {
                Ok(count) => {
                    if count > 0 {
                        tracing::info!(count, "Processed due reminders");
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Reminder sweep failed");
                }
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheduler_config_default() {
        let config = SchedulerConfig::default();
        assert_eq!(config.reminder_sweep_interval, Duration::from_secs(60));
    }
}
