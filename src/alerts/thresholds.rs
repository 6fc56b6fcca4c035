use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::usage::UsageSnapshot;

#[derive(Debug, Clone, PartialEq)]
pub enum AlertType {
    AllowanceThreshold {
        percent: u8,
        peak_gib: f64,
        allowance_gib: f64,
        period_end: DateTime<Utc>,
    },
    FetchFailed {
        message: String,
    },
}

impl AlertType {
    pub fn alert_id(&self) -> &'static str {
        match self {
            AlertType::AllowanceThreshold { .. } => "allowance_threshold",
            AlertType::FetchFailed { .. } => "fetch_failed",
        }
    }

    pub fn title(&self) -> String {
        match self {
            AlertType::AllowanceThreshold { percent, .. } => {
                format!("Peak usage has reached {}% of your allowance", percent)
            }
            AlertType::FetchFailed { .. } => "Error".to_string(),
        }
    }

    pub fn message(&self) -> String {
        match self {
            AlertType::AllowanceThreshold {
                peak_gib,
                allowance_gib,
                period_end,
                ..
            } => {
                format!(
                    "You have used {:.2} GB of your {} GB peak allowance. The billing period ends {}.",
                    peak_gib,
                    allowance_gib,
                    period_end.format("%-d %B %Y")
                )
            }
            AlertType::FetchFailed { message } => message.clone(),
        }
    }

    pub fn priority(&self) -> AlertPriority {
        match self {
            AlertType::AllowanceThreshold { percent, .. } if *percent >= 95 => AlertPriority::Critical,
            AlertType::AllowanceThreshold { percent, .. } if *percent >= 75 => AlertPriority::High,
            AlertType::AllowanceThreshold { .. } => AlertPriority::Medium,
            AlertType::FetchFailed { .. } => AlertPriority::Medium,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AlertPriority {
    Low,
    Medium,
    High,
    Critical,
}

/// Which threshold was last notified, and in which billing period
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationState {
    pub last_threshold: u8,
    /// Unix start of the billing period `last_threshold` belongs to
    pub period_start: i64,
}

/// Decides when peak usage has crossed an allowance threshold
#[derive(Debug, Clone)]
pub struct ThresholdTracker {
    thresholds: Vec<u8>, // ascending
}

impl ThresholdTracker {
    pub fn new(mut thresholds: Vec<u8>) -> Self {
        thresholds.retain(|t| *t > 0);
        thresholds.sort_unstable();
        thresholds.dedup();
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &[u8] {
        &self.thresholds
    }

    /// Highest configured threshold at or below `ratio`
    pub fn highest_reached(&self, ratio: f64) -> Option<u8> {
        self.thresholds
            .iter()
            .rev()
            .copied()
            .find(|t| ratio >= f64::from(*t) / 100.0)
    }

    /// Compare a snapshot against the thresholds, updating `state`.
    ///
    /// A new billing period resets the state. At most one alert is produced:
    /// for the highest threshold reached, and only if it is above the one
    /// already notified this period.
    pub fn evaluate(
        &self,
        snapshot: &UsageSnapshot,
        allowance_gib: f64,
        state: &mut NotificationState,
    ) -> Option<AlertType> {
        if state.period_start != snapshot.period_key() {
            *state = NotificationState {
                last_threshold: 0,
                period_start: snapshot.period_key(),
            };
        }

        let reached = self.highest_reached(snapshot.peak_ratio(allowance_gib))?;
        if reached <= state.last_threshold {
            return None;
        }

        state.last_threshold = reached;
        Some(AlertType::AllowanceThreshold {
            percent: reached,
            peak_gib: snapshot.peak_gib,
            allowance_gib,
            period_end: snapshot.period_end,
        })
    }
}

impl Default for ThresholdTracker {
    fn default() -> Self {
        Self::new(vec![75, 95])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const OCTOBER: i64 = 1_790_812_800;
    const NOVEMBER: i64 = 1_793_491_200;

    fn snapshot(peak_gib: f64, period_start: i64) -> UsageSnapshot {
        UsageSnapshot {
            peak_gib,
            off_peak_gib: 0.0,
            total_gib: peak_gib,
            period_start: Utc.timestamp_opt(period_start, 0).unwrap(),
            period_end: Utc.timestamp_opt(period_start + 30 * 86_400, 0).unwrap(),
        }
    }

    fn fired(alerts: &[Option<AlertType>]) -> Vec<u8> {
        alerts
            .iter()
            .flatten()
            .map(|alert| match alert {
                AlertType::AllowanceThreshold { percent, .. } => *percent,
                other => panic!("unexpected alert {:?}", other),
            })
            .collect()
    }

    #[test]
    fn test_each_threshold_fires_once_per_period() {
        let tracker = ThresholdTracker::default();
        let mut state = NotificationState::default();

        let alerts: Vec<_> = [10.0, 44.0, 45.0, 50.0, 56.0, 57.0, 58.0, 60.0]
            .iter()
            .map(|peak| tracker.evaluate(&snapshot(*peak, OCTOBER), 60.0, &mut state))
            .collect();

        assert_eq!(fired(&alerts), vec![75, 95]);
        assert_eq!(state.last_threshold, 95);
    }

    #[test]
    fn test_no_alert_below_lowest_threshold() {
        let tracker = ThresholdTracker::default();
        let mut state = NotificationState::default();

        assert!(tracker.evaluate(&snapshot(44.9, OCTOBER), 60.0, &mut state).is_none());
        assert_eq!(state.last_threshold, 0);
        assert_eq!(state.period_start, OCTOBER);
    }

    #[test]
    fn test_jump_past_both_thresholds_fires_highest_only() {
        let tracker = ThresholdTracker::default();
        let mut state = NotificationState::default();

        let first = tracker.evaluate(&snapshot(59.0, OCTOBER), 60.0, &mut state);
        assert_eq!(fired(&[first]), vec![95]);

        // 75% was skipped and must not fire afterwards in the same period
        let second = tracker.evaluate(&snapshot(59.5, OCTOBER), 60.0, &mut state);
        assert!(second.is_none());
    }

    #[test]
    fn test_dropping_below_and_rising_again_does_not_refire() {
        let tracker = ThresholdTracker::default();
        let mut state = NotificationState::default();

        let alerts = vec![
            tracker.evaluate(&snapshot(46.0, OCTOBER), 60.0, &mut state),
            // Allowance raised: ratio falls back under 75%
            tracker.evaluate(&snapshot(46.0, OCTOBER), 90.0, &mut state),
            tracker.evaluate(&snapshot(70.0, OCTOBER), 90.0, &mut state),
        ];

        assert_eq!(fired(&alerts), vec![75]);
    }

    #[test]
    fn test_new_billing_period_resets() {
        let tracker = ThresholdTracker::default();
        let mut state = NotificationState::default();

        let alerts = vec![
            tracker.evaluate(&snapshot(58.0, OCTOBER), 60.0, &mut state),
            tracker.evaluate(&snapshot(2.0, NOVEMBER), 60.0, &mut state),
            tracker.evaluate(&snapshot(46.0, NOVEMBER), 60.0, &mut state),
            tracker.evaluate(&snapshot(58.0, NOVEMBER), 60.0, &mut state),
        ];

        assert_eq!(fired(&alerts), vec![95, 75, 95]);
        assert_eq!(state.period_start, NOVEMBER);
    }

    #[test]
    fn test_exact_threshold_counts_as_crossed() {
        let tracker = ThresholdTracker::default();
        let mut state = NotificationState::default();

        let alert = tracker.evaluate(&snapshot(45.0, OCTOBER), 60.0, &mut state);
        assert_eq!(fired(&[alert]), vec![75]);
    }

    #[test]
    fn test_custom_thresholds_are_sorted() {
        let tracker = ThresholdTracker::new(vec![90, 50, 0, 50]);
        assert_eq!(tracker.thresholds(), &[50, 90]);
        assert_eq!(tracker.highest_reached(0.6), Some(50));
        assert_eq!(tracker.highest_reached(0.95), Some(90));
        assert_eq!(tracker.highest_reached(0.1), None);
    }

    #[test]
    fn test_alert_text_and_priority() {
        let alert = AlertType::AllowanceThreshold {
            percent: 95,
            peak_gib: 57.123,
            allowance_gib: 60.0,
            period_end: Utc.with_ymd_and_hms(2026, 10, 31, 0, 0, 0).unwrap(),
        };
        assert_eq!(alert.alert_id(), "allowance_threshold");
        assert_eq!(alert.title(), "Peak usage has reached 95% of your allowance");
        assert_eq!(
            alert.message(),
            "You have used 57.12 GB of your 60 GB peak allowance. The billing period ends 31 October 2026."
        );
        assert_eq!(alert.priority(), AlertPriority::Critical);

        let failure = AlertType::FetchFailed {
            message: "Could not get usage information: Invalid Hash Code".to_string(),
        };
        assert_eq!(failure.priority(), AlertPriority::Medium);
        assert_eq!(failure.message(), "Could not get usage information: Invalid Hash Code");
    }
}
