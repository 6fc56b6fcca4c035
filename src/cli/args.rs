use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "aquiss-usage")]
#[command(about = "Aquiss broadband usage monitor")]
#[command(version)]
pub struct Cli {
    /// Custom config file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// JSON output format
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable styled table output
    #[arg(long, global = true)]
    pub colored: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,
    /// Initialize fresh configuration
    Init,
    /// Set configuration value
    Set {
        /// Configuration key (e.g., polling.interval_minutes)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate and save your hash code and monthly allowance
    Login {
        /// Hash code from the Aquiss control panel
        hash_code: String,

        /// Monthly peak allowance in GB
        #[arg(long)]
        allowance: f64,
    },

    /// Forget the saved hash code
    Logout,

    /// Fetch and show current usage (default)
    Status,

    /// Poll in the background and notify as usage approaches the allowance
    Watch {
        /// Minutes between checks (overrides polling.interval_minutes)
        #[arg(long)]
        interval: Option<u32>,
    },

    /// Live usage panel in the terminal
    Dashboard {
        /// Minutes between checks (overrides polling.interval_minutes)
        #[arg(long)]
        interval: Option<u32>,
    },

    /// Show stored settings
    Settings,

    /// Send a test desktop notification
    #[command(name = "test-notification")]
    TestNotification,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}
