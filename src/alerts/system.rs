use crate::alerts::{
    notifications::NotificationHandler,
    thresholds::{AlertType, ThresholdTracker},
};
use crate::config::AlertsConfig;
use crate::storage::SettingsStore;
use crate::usage::UsageSnapshot;
use anyhow::{Context, Result};

pub struct AlertSystem {
    pub tracker: ThresholdTracker,
    pub notification_handler: NotificationHandler,
}

impl AlertSystem {
    pub fn new(tracker: ThresholdTracker, notifications_enabled: bool) -> Self {
        Self {
            tracker,
            notification_handler: NotificationHandler::new(notifications_enabled),
        }
    }

    pub fn from_config(config: &AlertsConfig) -> Self {
        let enabled = config.notifications_enabled && NotificationHandler::is_available();
        if config.notifications_enabled && !enabled {
            tracing::info!("no desktop session detected, notifications disabled");
        }
        Self::new(ThresholdTracker::new(config.thresholds.clone()), enabled)
    }

    /// Evaluate the snapshot against the thresholds, persisting the de-duplication state
    pub fn check_usage(
        &self,
        snapshot: &UsageSnapshot,
        allowance_gib: f64,
        store: &SettingsStore,
    ) -> Result<Vec<AlertType>> {
        let alert = store
            .update_notification_state(|state| self.tracker.evaluate(snapshot, allowance_gib, state))
            .context("Failed to update notification state")?;

        Ok(alert.into_iter().collect())
    }

    /// Send notifications for triggered alerts
    pub fn send_notifications(&self, alerts: &[AlertType]) -> Result<()> {
        for alert in alerts {
            tracing::info!(alert = alert.alert_id(), "{}", alert.title());
            self.notification_handler
                .send_alert(alert)
                .with_context(|| format!("Failed to send notification for alert: {}", alert.alert_id()))?;
        }
        Ok(())
    }

    /// Surface a failed fetch the way a threshold alert is surfaced
    pub fn report_fetch_failure(&self, message: &str) -> Result<()> {
        let alert = AlertType::FetchFailed {
            message: message.to_string(),
        };
        self.notification_handler
            .send_alert(&alert)
            .context("Failed to send fetch failure notification")
    }

    pub fn test_notifications(&self) -> Result<()> {
        self.notification_handler
            .send_test_notification()
            .context("Failed to send test notification")
    }
}

impl Default for AlertSystem {
    fn default() -> Self {
        Self::new(ThresholdTracker::default(), NotificationHandler::is_available())
    }
}
