use crate::alerts::thresholds::{AlertPriority, AlertType};
use anyhow::{Context, Result};
use notify_rust::{Notification, Timeout};

const APP_NAME: &str = "aquiss-usage";

pub struct NotificationHandler {
    enabled: bool,
}

impl NotificationHandler {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn send_alert(&self, alert: &AlertType) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        let timeout = match alert.priority() {
            AlertPriority::Critical => Timeout::Never,
            AlertPriority::High => Timeout::Milliseconds(10000),
            AlertPriority::Medium => Timeout::Milliseconds(7000),
            AlertPriority::Low => Timeout::Milliseconds(5000),
        };

        let icon = match alert {
            AlertType::AllowanceThreshold { .. } => "dialog-warning",
            AlertType::FetchFailed { .. } => "dialog-error",
        };

        let mut notification = Notification::new();
        notification
            .summary(&alert.title())
            .body(&alert.message())
            .timeout(timeout)
            .appname(APP_NAME)
            .icon(icon);

        // Urgency is only understood by freedesktop notification servers
        #[cfg(all(unix, not(target_os = "macos")))]
        notification.urgency(match alert.priority() {
            AlertPriority::Critical | AlertPriority::High => notify_rust::Urgency::Critical,
            AlertPriority::Medium => notify_rust::Urgency::Normal,
            AlertPriority::Low => notify_rust::Urgency::Low,
        });

        notification
            .show()
            .context("Failed to show desktop notification")?;

        Ok(())
    }

    pub fn send_test_notification(&self) -> Result<()> {
        if !self.enabled {
            return Err(anyhow::anyhow!("Desktop notifications are disabled"));
        }

        Notification::new()
            .summary("aquiss-usage notification test")
            .body("Desktop notifications are working. You'll be alerted as peak usage approaches your allowance.")
            .timeout(Timeout::Milliseconds(5000))
            .appname(APP_NAME)
            .icon("dialog-information")
            .show()
            .context("Failed to show test notification")?;

        Ok(())
    }

    pub fn is_available() -> bool {
        #[cfg(target_os = "linux")]
        {
            std::env::var("DISPLAY").is_ok() || std::env::var("WAYLAND_DISPLAY").is_ok()
        }

        #[cfg(any(target_os = "macos", target_os = "windows"))]
        {
            true
        }

        #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
        {
            false
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl Default for NotificationHandler {
    fn default() -> Self {
        Self::new(Self::is_available())
    }
}
