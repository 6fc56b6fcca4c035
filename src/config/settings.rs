use serde::{Deserialize, Serialize};
use anyhow::{Result, Context};
use std::path::{Path, PathBuf};
use std::fs;
use std::time::Duration;

use crate::utils::date_format::{DateFormat, DisplayTimezone};

pub const APP_DIR_NAME: &str = "aquiss-usage";
pub const DEFAULT_API_BASE_URL: &str = "http://api.aquiss.net/stable";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub polling: PollingConfig,
    pub alerts: AlertsConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    pub interval_minutes: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertsConfig {
    pub notifications_enabled: bool,
    pub thresholds: Vec<u8>, // percent of allowance, ascending
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub colored: bool,
    pub decimal_places: u8,
    pub date_format: String, // "long", "yyyy-mm-dd", "dd-mm-yyyy", "mm-dd-yyyy"
    pub timezone: String,    // "local" or an IANA name such as "Europe/London"
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self { interval_minutes: 30 }
    }
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            notifications_enabled: true,
            thresholds: vec![75, 95],
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            colored: false,
            decimal_places: 2,
            date_format: "long".to_string(),
            timezone: "local".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            polling: PollingConfig::default(),
            alerts: AlertsConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.interval_minutes) * 60)
    }
}

impl Config {
    /// Load from `config_path`, writing a commented default file if it does not exist yet
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            let config = Self::default();
            config.save_to(config_path)?;
            return Ok(config);
        }

        let contents = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        let contents = self.to_commented_toml()?;

        fs::write(config_path, contents)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

        Ok(())
    }

    /// Generate TOML configuration with comments explaining every option
    pub fn to_commented_toml(&self) -> Result<String> {
        let mut output = String::new();

        output.push_str("# aquiss-usage Configuration File\n");
        output.push_str("#\n");
        output.push_str("# Credentials and notification state live in settings.toml next to this file.\n");
        output.push_str("# All settings have sensible defaults.\n");
        output.push('\n');

        output.push_str("[api]\n");
        output.push_str("# Base URL of the usage API; usage-xml.php is appended to it\n");
        output.push_str(&format!("base_url = \"{}\"\n", self.api.base_url));
        output.push('\n');
        output.push_str("# Request timeout in seconds\n");
        output.push_str(&format!("timeout_secs = {}\n", self.api.timeout_secs));
        output.push('\n');

        output.push_str("[polling]\n");
        output.push_str("# Minutes between usage checks in watch and dashboard modes\n");
        output.push_str(&format!("interval_minutes = {}\n", self.polling.interval_minutes));
        output.push('\n');

        output.push_str("[alerts]\n");
        output.push_str("# Send desktop notifications when peak usage crosses a threshold\n");
        output.push_str(&format!("notifications_enabled = {}\n", self.alerts.notifications_enabled));
        output.push('\n');
        output.push_str("# Percentages of the allowance that trigger a notification.\n");
        output.push_str("# Each one fires at most once per billing period.\n");
        let thresholds = self
            .alerts
            .thresholds
            .iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        output.push_str(&format!("thresholds = [{}]\n", thresholds));
        output.push('\n');

        output.push_str("[output]\n");
        output.push_str("# Enable colored table output by default\n");
        output.push_str(&format!("colored = {}\n", self.output.colored));
        output.push('\n');
        output.push_str("# Number of decimal places for GB figures\n");
        output.push_str(&format!("decimal_places = {}\n", self.output.decimal_places));
        output.push('\n');
        output.push_str("# Billing period date style:\n");
        output.push_str("#   \"long\"       - Thursday, 1 October 2026\n");
        output.push_str("#   \"yyyy-mm-dd\" - 2026-10-01\n");
        output.push_str("#   \"dd-mm-yyyy\" - 01-10-2026\n");
        output.push_str("#   \"mm-dd-yyyy\" - 10-01-2026\n");
        output.push_str(&format!("date_format = \"{}\"\n", self.output.date_format));
        output.push('\n');
        output.push_str("# Timezone for displaying dates: \"local\" or a name such as \"Europe/London\"\n");
        output.push_str(&format!("timezone = \"{}\"\n", self.output.timezone));

        Ok(output)
    }

    pub fn default_dir() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .context("Failed to determine home directory")?;
        Ok(home.join(".config").join(APP_DIR_NAME))
    }

    pub fn default_path() -> Result<PathBuf> {
        Ok(Self::default_dir()?.join("config.toml"))
    }

    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            anyhow::bail!("api.base_url must not be empty");
        }
        if self.api.timeout_secs == 0 {
            anyhow::bail!("api.timeout_secs must be at least 1");
        }
        if self.polling.interval_minutes == 0 {
            anyhow::bail!("polling.interval_minutes must be at least 1");
        }
        validate_thresholds(&self.alerts.thresholds)?;
        if self.output.decimal_places > 10 {
            anyhow::bail!("Decimal places must be between 0 and 10");
        }
        DateFormat::from_config_str(&self.output.date_format)?;
        DisplayTimezone::parse(&self.output.timezone)?;
        Ok(())
    }

    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "api.base_url" => {
                if value.trim().is_empty() {
                    anyhow::bail!("api.base_url must not be empty");
                }
                self.api.base_url = value.to_string();
            }
            "api.timeout_secs" => {
                let secs: u64 = value.parse()
                    .with_context(|| format!("Invalid timeout value: {}", value))?;
                if secs == 0 {
                    anyhow::bail!("Timeout must be at least 1 second");
                }
                self.api.timeout_secs = secs;
            }
            "polling.interval_minutes" => {
                let minutes: u32 = value.parse()
                    .with_context(|| format!("Invalid interval value: {}", value))?;
                if minutes == 0 {
                    anyhow::bail!("Interval must be at least 1 minute");
                }
                self.polling.interval_minutes = minutes;
            }
            "alerts.notifications_enabled" => {
                self.alerts.notifications_enabled = value.parse()
                    .with_context(|| format!("Invalid boolean value: {}", value))?;
            }
            "alerts.thresholds" => {
                self.alerts.thresholds = parse_thresholds(value)?;
            }
            "output.colored" => {
                self.output.colored = value.parse()
                    .with_context(|| format!("Invalid boolean value: {}", value))?;
            }
            "output.decimal_places" => {
                let places: u8 = value.parse()
                    .with_context(|| format!("Invalid decimal places value: {}", value))?;
                if places > 10 {
                    anyhow::bail!("Decimal places must be between 0 and 10");
                }
                self.output.decimal_places = places;
            }
            "output.date_format" => {
                DateFormat::from_config_str(value)?;
                self.output.date_format = value.to_lowercase();
            }
            "output.timezone" => {
                DisplayTimezone::parse(value)?;
                self.output.timezone = value.to_string();
            }
            _ => anyhow::bail!("Unknown configuration key: {}", key),
        }
        Ok(())
    }
}

/// Parse a comma-separated threshold list such as "75,95"
pub fn parse_thresholds(value: &str) -> Result<Vec<u8>> {
    let mut thresholds = value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.trim_end_matches('%')
                .parse::<u8>()
                .with_context(|| format!("Invalid threshold value: {}", s))
        })
        .collect::<Result<Vec<_>>>()?;

    thresholds.sort_unstable();
    thresholds.dedup();
    validate_thresholds(&thresholds)?;
    Ok(thresholds)
}

fn validate_thresholds(thresholds: &[u8]) -> Result<()> {
    if thresholds.is_empty() {
        anyhow::bail!("At least one alert threshold is required");
    }
    if let Some(bad) = thresholds.iter().find(|t| **t == 0 || **t > 100) {
        anyhow::bail!("Threshold {} is out of range; must be between 1 and 100", bad);
    }
    Ok(())
}
