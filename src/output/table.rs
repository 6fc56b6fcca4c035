use chrono::{DateTime, Utc};
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::usage::UsageSnapshot;
use crate::utils::{DateFormatter, format_gb, format_percent};

/// One line of the usage summary table
#[derive(Tabled, Serialize, Debug, PartialEq)]
pub struct UsageRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

impl UsageRow {
    fn new(metric: &str, value: String) -> Self {
        Self {
            metric: metric.to_string(),
            value,
        }
    }
}

/// Machine-readable form of a usage snapshot
#[derive(Serialize, Debug)]
pub struct UsageReport {
    pub status: &'static str,
    pub peak_gib: f64,
    pub off_peak_gib: f64,
    pub total_gib: f64,
    pub allowance_gib: Option<f64>,
    pub peak_percent: Option<f64>,
    pub level: Option<&'static str>,
    pub period_start: String,
    pub period_end: String,
    pub days_remaining: i64,
}

impl UsageReport {
    pub fn new(
        snapshot: &UsageSnapshot,
        allowance_gib: Option<f64>,
        formatter: &DateFormatter,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            status: "success",
            peak_gib: snapshot.peak_gib,
            off_peak_gib: snapshot.off_peak_gib,
            total_gib: snapshot.total_gib,
            allowance_gib,
            peak_percent: allowance_gib.map(|a| snapshot.peak_ratio(a) * 100.0),
            level: allowance_gib.map(|a| snapshot.level(a).label()),
            period_start: formatter.format_for_json(&snapshot.period_start),
            period_end: formatter.format_for_json(&snapshot.period_end),
            days_remaining: snapshot.days_remaining(now),
        }
    }
}

/// Build the rows shown by `status`
pub fn usage_rows(
    snapshot: &UsageSnapshot,
    allowance_gib: Option<f64>,
    formatter: &DateFormatter,
    decimal_places: u8,
    now: DateTime<Utc>,
) -> Vec<UsageRow> {
    let mut rows = vec![
        UsageRow::new("Peak usage", format_gb(snapshot.peak_gib, decimal_places)),
        UsageRow::new("Off-peak usage", format_gb(snapshot.off_peak_gib, decimal_places)),
        UsageRow::new("Total usage", format_gb(snapshot.total_gib, decimal_places)),
    ];

    if let Some(allowance) = allowance_gib {
        rows.push(UsageRow::new("Allowance", format!("{} GB", allowance)));
        rows.push(UsageRow::new(
            "Peak used",
            format!(
                "{} ({})",
                format_percent(snapshot.peak_ratio(allowance)),
                snapshot.level(allowance).label()
            ),
        ));
        rows.push(UsageRow::new(
            "Peak remaining",
            format_gb(snapshot.remaining_gib(allowance), decimal_places),
        ));
    }

    rows.push(UsageRow::new("Period began", formatter.format_date(&snapshot.period_start)));
    rows.push(UsageRow::new("Period ends", formatter.format_date(&snapshot.period_end)));
    rows.push(UsageRow::new(
        "Days remaining",
        snapshot.days_remaining(now).to_string(),
    ));

    rows
}

pub fn render_table(rows: Vec<UsageRow>, colored: bool) -> String {
    let mut table = Table::new(rows);
    if colored {
        table.with(Style::modern());
    }
    table.to_string()
}
