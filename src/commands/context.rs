use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::alerts::AlertSystem;
use crate::api::UsageApiClient;
use crate::config::Config;
use crate::storage::SettingsStore;
use crate::usage::UsageChecker;
use crate::utils::DateFormatter;

/// Configuration and settings shared by every command
pub struct AppContext {
    pub config: Config,
    pub config_path: PathBuf,
    pub store: Arc<SettingsStore>,
}

impl AppContext {
    /// Load the config file (default location unless overridden) and the settings store beside it
    pub fn load(config_override: Option<&Path>) -> Result<Self> {
        let config_path = match config_override {
            Some(path) => path.to_path_buf(),
            None => Config::default_path()?,
        };
        let config = Config::load_from(&config_path)?;

        let config_dir = match config_path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => std::env::current_dir().context("Failed to determine current directory")?,
        };
        let store = SettingsStore::open(&SettingsStore::default_path(&config_dir))?;
        tracing::debug!(config = %config_path.display(), settings = %store.path().display(), "loaded configuration");

        Ok(Self {
            config,
            config_path,
            store: Arc::new(store),
        })
    }

    pub fn client(&self) -> Result<UsageApiClient> {
        UsageApiClient::new(&self.config.api)
    }

    pub fn date_formatter(&self) -> Result<DateFormatter> {
        DateFormatter::new(&self.config.output.date_format, &self.config.output.timezone)
    }

    pub fn require_hash_code(&self) -> Result<String> {
        self.store.hash_code()?.ok_or_else(|| {
            anyhow::anyhow!("Not logged in. Run `aquiss-usage login <HASH_CODE> --allowance <GB>` first")
        })
    }

    /// Polling interval, with an optional override in minutes
    pub fn poll_interval(&self, override_minutes: Option<u32>) -> Result<Duration> {
        match override_minutes {
            Some(0) => anyhow::bail!("Interval must be at least 1 minute"),
            Some(minutes) => Ok(Duration::from_secs(u64::from(minutes) * 60)),
            None => Ok(self.config.polling.interval()),
        }
    }

    pub fn checker(&self, hash_code: String, interval: Duration) -> Result<UsageChecker> {
        Ok(UsageChecker::new(
            self.client()?,
            hash_code,
            Arc::clone(&self.store),
            Arc::new(AlertSystem::from_config(&self.config.alerts)),
            interval,
        ))
    }
}

/// Print an error in the requested output format
pub fn handle_error(error: &anyhow::Error, json_output: bool) {
    if json_output {
        let body = serde_json::json!({
            "status": "error",
            "message": format!("{:#}", error),
        });
        println!("{}", body);
    } else {
        eprintln!("Error: {:#}", error);
    }
}
