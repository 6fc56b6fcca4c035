// aquiss-usage: Aquiss broadband usage monitor
use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use aquiss_usage::cli::{Cli, Commands};
use aquiss_usage::commands::{
    AppContext, handle_config_action, handle_dashboard_command, handle_error,
    handle_login_command, handle_logout_command, handle_settings_command,
    handle_status_command, handle_test_notification_command, handle_watch_command,
};
use aquiss_usage::config::Config;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // The dashboard owns the terminal, so log lines would corrupt it
    let dashboard = matches!(cli.command, Some(Commands::Dashboard { .. }));
    setup_logging(cli.verbose, dashboard);

    let json_output = cli.json;
    if let Err(e) = run(cli).await {
        handle_error(&e, json_output);
        std::process::exit(1);
    }
}

fn setup_logging(verbose: bool, dashboard: bool) {
    let filter = if dashboard {
        EnvFilter::new("off")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            if verbose {
                EnvFilter::new("aquiss_usage=debug")
            } else {
                EnvFilter::new("aquiss_usage=info")
            }
        })
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let command = match cli.command {
        // Config management works even when the current file fails validation
        Some(Commands::Config { action }) => {
            let config_path = match cli.config {
                Some(path) => path,
                None => Config::default_path()?,
            };
            return handle_config_action(action, &config_path, cli.json);
        }
        Some(command) => command,
        None => Commands::Status,
    };

    let ctx = AppContext::load(cli.config.as_deref())?;
    let colored = cli.colored || ctx.config.output.colored;

    match command {
        Commands::Login {
            hash_code,
            allowance,
        } => handle_login_command(&ctx, &hash_code, allowance, cli.json).await,
        Commands::Logout => handle_logout_command(&ctx, cli.json),
        Commands::Status => handle_status_command(&ctx, cli.json, colored).await,
        Commands::Watch { interval } => handle_watch_command(&ctx, interval, cli.json).await,
        Commands::Dashboard { interval } => handle_dashboard_command(&ctx, interval).await,
        Commands::Settings => handle_settings_command(&ctx, cli.json),
        Commands::TestNotification => handle_test_notification_command(&ctx, cli.json),
        Commands::Config { action } => handle_config_action(action, &ctx.config_path, cli.json),
    }
}
