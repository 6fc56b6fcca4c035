use anyhow::Result;
use std::sync::Arc;

use crate::commands::context::AppContext;
use crate::commands::login::clear_login;
use crate::dashboard::{Dashboard, DashboardExit, RenderContext};

pub async fn handle_dashboard_command(ctx: &AppContext, interval_override: Option<u32>) -> Result<()> {
    let hash_code = ctx.require_hash_code()?;
    let interval = ctx.poll_interval(interval_override)?;
    let formatter = ctx.date_formatter()?;
    let render_ctx = RenderContext {
        formatter: &formatter,
        decimal_places: ctx.config.output.decimal_places,
    };

    let checker = Arc::new(ctx.checker(hash_code, interval)?);
    let events = checker.subscribe();
    let handle = checker.start();

    let mut dashboard = Dashboard::new(ctx.store.allowance()?)?;
    let exit = dashboard
        .run(&checker, &handle, &ctx.store, events, &render_ctx)
        .await;

    handle.stop();
    dashboard.cleanup()?;

    if exit? == DashboardExit::Logout {
        clear_login(&ctx.store)?;
        println!("Logged out.");
    }

    Ok(())
}
