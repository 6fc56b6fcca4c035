use chrono::{DateTime, Utc};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::usage::{UsageEvent, UsageLevel, UsageSnapshot};

/// What the event loop should do after a key press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardAction {
    None,
    Refresh,
    Logout,
    Quit,
}

#[derive(Debug, Clone)]
pub struct DashboardState {
    pub snapshot: Option<UsageSnapshot>,
    pub allowance_gib: Option<f64>,
    pub last_update: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub refreshing: bool,
    pub show_help: bool,
}

impl DashboardState {
    pub fn new(allowance_gib: Option<f64>) -> Self {
        DashboardState {
            snapshot: None,
            allowance_gib,
            last_update: None,
            last_error: None,
            // The checker fetches immediately on start
            refreshing: true,
            show_help: false,
        }
    }

    pub fn apply_event(&mut self, event: UsageEvent, now: DateTime<Utc>) {
        self.refreshing = false;
        self.last_update = Some(now);

        match event {
            UsageEvent::Updated(snapshot) => {
                self.snapshot = Some(snapshot);
                self.last_error = None;
            }
            UsageEvent::FetchFailed(message) => {
                self.last_error = Some(message);
            }
        }
    }

    /// Mirror the checker's cache, which is cleared when the hash code is rejected
    pub fn sync_cached(&mut self, cached: Option<UsageSnapshot>) {
        self.snapshot = cached;
    }

    /// Missed events: take the checker's cache as current and end any pending refresh
    pub fn catch_up(&mut self, cached: Option<UsageSnapshot>) {
        self.sync_cached(cached);
        self.refreshing = false;
    }

    pub fn set_allowance(&mut self, allowance_gib: Option<f64>) {
        self.allowance_gib = allowance_gib;
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> DashboardAction {
        if key.kind != KeyEventKind::Press {
            return DashboardAction::None;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => DashboardAction::Quit,
            KeyCode::Char('c') | KeyCode::Char('d')
                if key.modifiers.contains(KeyModifiers::CONTROL) =>
            {
                DashboardAction::Quit
            }
            KeyCode::Char('h') | KeyCode::F(1) => {
                self.show_help = !self.show_help;
                DashboardAction::None
            }
            KeyCode::Char('r') => {
                if self.refreshing {
                    return DashboardAction::None;
                }
                self.refreshing = true;
                DashboardAction::Refresh
            }
            KeyCode::Char('l') => DashboardAction::Logout,
            _ => DashboardAction::None,
        }
    }

    /// Peak usage as a fraction of the allowance, clamped for the gauge
    pub fn gauge_ratio(&self) -> Option<f64> {
        let snapshot = self.snapshot.as_ref()?;
        let allowance = self.allowance_gib?;
        Some(snapshot.peak_ratio(allowance).clamp(0.0, 1.0))
    }

    pub fn level(&self) -> UsageLevel {
        match (&self.snapshot, self.allowance_gib) {
            (Some(snapshot), Some(allowance)) => snapshot.level(allowance),
            _ => UsageLevel::Normal,
        }
    }

    pub fn status_line(&self) -> String {
        if self.refreshing {
            if self.snapshot.is_none() && self.last_error.is_none() {
                return "Loading...".to_string();
            }
            return "Refreshing...".to_string();
        }
        if let Some(error) = &self.last_error {
            return error.clone();
        }
        match self.last_update {
            Some(at) => format!("Updated {}", at.format("%H:%M:%S")),
            None => "Waiting for usage data".to_string(),
        }
    }
}
