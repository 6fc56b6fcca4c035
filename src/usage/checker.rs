use chrono::Utc;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{Notify, broadcast};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};

use crate::alerts::AlertSystem;
use crate::api::{UsageApiClient, UsageError};
use crate::storage::SettingsStore;
use crate::usage::snapshot::UsageSnapshot;

const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Published to subscribers after every fetch
#[derive(Debug, Clone, PartialEq)]
pub enum UsageEvent {
    Updated(UsageSnapshot),
    FetchFailed(String),
}

/// Fetches usage for one hash code, caches the latest snapshot and raises alerts
pub struct UsageChecker {
    client: UsageApiClient,
    hash_code: String,
    store: Arc<SettingsStore>,
    alerts: Arc<AlertSystem>,
    interval: Duration,
    notify_failures: bool,
    current: Mutex<Option<UsageSnapshot>>,
    events: broadcast::Sender<UsageEvent>,
}

impl UsageChecker {
    pub fn new(
        client: UsageApiClient,
        hash_code: String,
        store: Arc<SettingsStore>,
        alerts: Arc<AlertSystem>,
        interval: Duration,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            client,
            hash_code,
            store,
            alerts,
            interval,
            notify_failures: false,
            current: Mutex::new(None),
            events,
        }
    }

    /// Also send a desktop notification when a fetch fails
    pub fn with_failure_notifications(mut self, enabled: bool) -> Self {
        self.notify_failures = enabled;
        self
    }

    pub fn current_usage(&self) -> Option<UsageSnapshot> {
        self.current.lock().ok().and_then(|guard| guard.clone())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<UsageEvent> {
        self.events.subscribe()
    }

    /// Immediately request new usage data
    pub async fn update_usage_information(&self) -> Result<UsageSnapshot, UsageError> {
        let result = self
            .client
            .fetch_usage(&self.hash_code)
            .await
            .and_then(|response| {
                if !response.is_valid() {
                    tracing::debug!(response = %response.response, "usage API rejected hash code");
                }
                UsageSnapshot::from_response(&response)
            });

        match &result {
            Ok(snapshot) => self.handle_update(snapshot),
            Err(e) => self.handle_failure(e),
        }

        result
    }

    fn handle_update(&self, snapshot: &UsageSnapshot) {
        self.set_current(Some(snapshot.clone()));
        tracing::info!(
            peak_gib = snapshot.peak_gib,
            off_peak_gib = snapshot.off_peak_gib,
            total_gib = snapshot.total_gib,
            "usage updated"
        );

        if let Err(e) = self.store.set_last_checked(Utc::now()) {
            tracing::warn!(error = %e, "failed to record last check time");
        }

        self.check_thresholds(snapshot);
        let _ = self.events.send(UsageEvent::Updated(snapshot.clone()));
    }

    fn handle_failure(&self, error: &UsageError) {
        if matches!(error, UsageError::InvalidHashCode) {
            self.set_current(None);
        }

        let message = error.user_message();
        tracing::warn!("{}", message);

        if self.notify_failures {
            if let Err(e) = self.alerts.report_fetch_failure(&message) {
                tracing::warn!(error = %e, "failed to show fetch failure notification");
            }
        }

        let _ = self.events.send(UsageEvent::FetchFailed(message));
    }

    fn check_thresholds(&self, snapshot: &UsageSnapshot) {
        let allowance = match self.store.allowance() {
            Ok(Some(allowance)) => allowance,
            Ok(None) => {
                tracing::debug!("no allowance configured, skipping threshold check");
                return;
            }
            Err(e) => {
                tracing::warn!(error = %e, "cannot read allowance, skipping threshold check");
                return;
            }
        };

        let result = self
            .alerts
            .check_usage(snapshot, allowance, &self.store)
            .and_then(|alerts| self.alerts.send_notifications(&alerts));

        if let Err(e) = result {
            tracing::warn!(error = %e, "threshold notification failed");
        }
    }

    fn set_current(&self, snapshot: Option<UsageSnapshot>) {
        match self.current.lock() {
            Ok(mut guard) => *guard = snapshot,
            Err(poisoned) => *poisoned.into_inner() = snapshot,
        }
    }

    /// Start polling in the background: one fetch now, then one per interval
    pub fn start(self: &Arc<Self>) -> UsageCheckerHandle {
        let checker = Arc::clone(self);
        let refresh = Arc::new(Notify::new());
        let refresh_signal = Arc::clone(&refresh);

        let task = tokio::spawn(async move {
            let mut ticker = interval(checker.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = refresh_signal.notified() => {
                        tracing::debug!("manual refresh requested");
                        ticker.reset();
                    }
                }

                let _ = checker.update_usage_information().await;
            }
        });

        tracing::info!(interval_secs = self.interval.as_secs(), "usage polling started");
        UsageCheckerHandle { task, refresh }
    }
}

/// Stops the polling task when dropped
pub struct UsageCheckerHandle {
    task: JoinHandle<()>,
    refresh: Arc<Notify>,
}

impl UsageCheckerHandle {
    /// Trigger an immediate fetch
    pub fn refresh(&self) {
        self.refresh.notify_one();
    }

    pub fn stop(self) {
        self.task.abort();
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for UsageCheckerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
