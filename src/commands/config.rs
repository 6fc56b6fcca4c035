use anyhow::{Context, Result};
use std::path::Path;

use crate::cli::ConfigAction;
use crate::config::Config;

pub fn handle_config_action(action: ConfigAction, config_path: &Path, json_output: bool) -> Result<()> {
    match action {
        ConfigAction::Init => {
            Config::default()
                .save_to(config_path)
                .context("Failed to initialize config")?;

            if json_output {
                println!(
                    r#"{{"status": "success", "message": "Configuration initialized successfully"}}"#
                );
            } else {
                println!("Configuration initialized at: {}", config_path.display());
            }
        }
        ConfigAction::Show => {
            let config = Config::load_from(config_path).context("Failed to load config")?;

            if json_output {
                let json = serde_json::to_string_pretty(&config)
                    .context("Failed to serialize config to JSON")?;
                println!("{}", json);
            } else {
                let toml_str = toml::to_string_pretty(&config)
                    .context("Failed to serialize config")?;
                println!("Configuration ({})", config_path.display());
                println!("{}", toml_str);
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load_from(config_path).context("Failed to load config")?;
            config
                .set_value(&key, &value)
                .context("Invalid configuration")?;
            config.save_to(config_path).context("Failed to save config")?;

            if json_output {
                println!(
                    "{}",
                    serde_json::json!({
                        "status": "success",
                        "message": format!("Configuration updated: {} = {}", key, value),
                    })
                );
            } else {
                println!("Configuration updated: {} = {}", key, value);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_set_persists_value() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");

        handle_config_action(ConfigAction::Init, &path, true).unwrap();
        handle_config_action(
            ConfigAction::Set {
                key: "polling.interval_minutes".to_string(),
                value: "15".to_string(),
            },
            &path,
            true,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.polling.interval_minutes, 15);
    }

    #[test]
    fn test_set_rejects_unknown_key() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");

        let result = handle_config_action(
            ConfigAction::Set {
                key: "general.colour".to_string(),
                value: "blue".to_string(),
            },
            &path,
            false,
        );
        assert!(result.is_err());
    }
}
