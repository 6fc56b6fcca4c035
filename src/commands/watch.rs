use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

use crate::commands::context::AppContext;
use crate::usage::{UsageEvent, UsageSnapshot};
use crate::utils::{DateFormatter, format_gb, format_percent};

pub async fn handle_watch_command(
    ctx: &AppContext,
    interval_override: Option<u32>,
    json_output: bool,
) -> Result<()> {
    let hash_code = ctx.require_hash_code()?;
    let interval = ctx.poll_interval(interval_override)?;
    let formatter = ctx.date_formatter()?;
    let decimal_places = ctx.config.output.decimal_places;

    let checker = Arc::new(
        ctx.checker(hash_code, interval)?
            .with_failure_notifications(true),
    );
    let mut events = checker.subscribe();
    let handle = checker.start();

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("stopping usage watch");
                break;
            }
            event = events.recv() => match event {
                Ok(UsageEvent::Updated(snapshot)) => {
                    // Allowance is re-read so a login from another shell takes effect
                    let allowance = ctx.store.allowance().unwrap_or_else(|e| {
                        tracing::warn!(error = %e, "cannot read allowance");
                        None
                    });
                    if json_output {
                        println!("{}", update_json(&snapshot, allowance, &formatter));
                    } else {
                        println!("{}", update_line(&snapshot, allowance, &formatter, decimal_places));
                    }
                }
                // Already logged and notified by the checker
                Ok(UsageEvent::FetchFailed(_)) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "watch output lagged behind usage events");
                }
                Err(RecvError::Closed) => break,
            }
        }
    }

    handle.stop();
    Ok(())
}

fn update_line(
    snapshot: &UsageSnapshot,
    allowance_gib: Option<f64>,
    formatter: &DateFormatter,
    decimal_places: u8,
) -> String {
    let peak = match allowance_gib {
        Some(allowance) => format!(
            "Peak {} / {} GB ({})",
            format_gb(snapshot.peak_gib, decimal_places),
            allowance,
            format_percent(snapshot.peak_ratio(allowance))
        ),
        None => format!("Peak {}", format_gb(snapshot.peak_gib, decimal_places)),
    };

    format!(
        "[{}] {} | Off-peak {} | Total {} | Period ends {}",
        formatter.format_datetime_with_time(&Utc::now()),
        peak,
        format_gb(snapshot.off_peak_gib, decimal_places),
        format_gb(snapshot.total_gib, decimal_places),
        formatter.format_date(&snapshot.period_end),
    )
}

fn update_json(
    snapshot: &UsageSnapshot,
    allowance_gib: Option<f64>,
    formatter: &DateFormatter,
) -> serde_json::Value {
    serde_json::json!({
        "checked_at": formatter.format_for_json(&Utc::now()),
        "peak_gib": snapshot.peak_gib,
        "off_peak_gib": snapshot.off_peak_gib,
        "total_gib": snapshot.total_gib,
        "allowance_gib": allowance_gib,
        "peak_percent": allowance_gib.map(|a| snapshot.peak_ratio(a) * 100.0),
        "period_end": formatter.format_for_json(&snapshot.period_end),
    })
}
