use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::{UsageError, UsageResponse};

/// Peak ratio at which the panel turns yellow
pub const WARNING_RATIO: f64 = 0.75;
/// Peak ratio at which the panel turns red
pub const CRITICAL_RATIO: f64 = 0.95;

/// Usage for the current billing period as reported by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageSnapshot {
    pub peak_gib: f64,
    pub off_peak_gib: f64,
    pub total_gib: f64,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageLevel {
    Normal,
    Warning,
    Critical,
}

impl UsageSnapshot {
    /// Build a snapshot from an API response; anything but `Valid` means the hash code was rejected
    pub fn from_response(response: &UsageResponse) -> Result<Self, UsageError> {
        if !response.is_valid() {
            return Err(UsageError::InvalidHashCode);
        }

        Ok(Self {
            peak_gib: response.usage_peak,
            off_peak_gib: response.usage_off_peak,
            total_gib: response.usage_total,
            period_start: timestamp_to_utc(response.usage_start_timestamp)?,
            period_end: timestamp_to_utc(response.usage_end_timestamp)?,
        })
    }

    /// Billing period key used for notification de-duplication
    pub fn period_key(&self) -> i64 {
        self.period_start.timestamp()
    }

    pub fn peak_ratio(&self, allowance_gib: f64) -> f64 {
        if allowance_gib <= 0.0 {
            return 0.0;
        }
        self.peak_gib / allowance_gib
    }

    pub fn remaining_gib(&self, allowance_gib: f64) -> f64 {
        (allowance_gib - self.peak_gib).max(0.0)
    }

    pub fn level(&self, allowance_gib: f64) -> UsageLevel {
        let ratio = self.peak_ratio(allowance_gib);
        if ratio >= CRITICAL_RATIO {
            UsageLevel::Critical
        } else if ratio >= WARNING_RATIO {
            UsageLevel::Warning
        } else {
            UsageLevel::Normal
        }
    }

    /// Whole days left in the billing period, never negative
    pub fn days_remaining(&self, now: DateTime<Utc>) -> i64 {
        self.period_end.signed_duration_since(now).num_days().max(0)
    }
}

impl UsageLevel {
    pub fn to_color(&self) -> ratatui::style::Color {
        match self {
            UsageLevel::Normal => ratatui::style::Color::Green,
            UsageLevel::Warning => ratatui::style::Color::Yellow,
            UsageLevel::Critical => ratatui::style::Color::Red,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            UsageLevel::Normal => "OK",
            UsageLevel::Warning => "Warning",
            UsageLevel::Critical => "Critical",
        }
    }
}

fn timestamp_to_utc(timestamp: i64) -> Result<DateTime<Utc>, UsageError> {
    DateTime::from_timestamp(timestamp, 0)
        .ok_or_else(|| UsageError::Malformed(format!("timestamp out of range: {timestamp}")))
}
