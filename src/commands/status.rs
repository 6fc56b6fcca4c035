use anyhow::Result;
use chrono::Utc;

use crate::commands::context::AppContext;
use crate::output::{UsageReport, render_table, usage_rows};

pub async fn handle_status_command(
    ctx: &AppContext,
    json_output: bool,
    colored: bool,
) -> Result<()> {
    let hash_code = ctx.require_hash_code()?;
    let formatter = ctx.date_formatter()?;
    let checker = ctx.checker(hash_code, ctx.config.polling.interval())?;

    let snapshot = checker
        .update_usage_information()
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;

    let allowance = ctx.store.allowance()?;
    let now = Utc::now();

    if json_output {
        let report = UsageReport::new(&snapshot, allowance, &formatter, now);
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        let rows = usage_rows(
            &snapshot,
            allowance,
            &formatter,
            ctx.config.output.decimal_places,
            now,
        );
        println!("{}", render_table(rows, colored));
    }

    Ok(())
}
