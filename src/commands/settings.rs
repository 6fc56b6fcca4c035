use anyhow::Result;
use std::collections::BTreeMap;

use crate::alerts::AlertSystem;
use crate::commands::context::AppContext;
use crate::storage::settings_store::KEY_HASH_CODE;

/// Print the settings store with the hash code masked
pub fn handle_settings_command(ctx: &AppContext, json_output: bool) -> Result<()> {
    let entries = masked_entries(ctx.store.entries()?);

    if json_output {
        println!(
            "{}",
            serde_json::json!({
                "path": ctx.store.path().display().to_string(),
                "settings": entries,
            })
        );
        return Ok(());
    }

    println!("Settings ({})", ctx.store.path().display());
    if entries.is_empty() {
        println!("No settings stored. Run `aquiss-usage login` to get started.");
    }
    for (key, value) in &entries {
        println!("{} = {}", key, value);
    }

    Ok(())
}

pub fn handle_test_notification_command(ctx: &AppContext, json_output: bool) -> Result<()> {
    AlertSystem::from_config(&ctx.config.alerts).test_notifications()?;

    if json_output {
        println!(r#"{{"status": "success", "message": "Test notification sent"}}"#);
    } else {
        println!("Test notification sent.");
    }
    Ok(())
}

fn masked_entries(mut entries: BTreeMap<String, String>) -> BTreeMap<String, String> {
    if let Some(hash_code) = entries.get_mut(KEY_HASH_CODE) {
        *hash_code = mask(hash_code);
    }
    entries
}

fn mask(value: &str) -> String {
    let visible: String = value.chars().rev().take(4).collect::<Vec<_>>().into_iter().rev().collect();
    if value.chars().count() <= 4 {
        return "*".repeat(value.chars().count());
    }
    format!("****{}", visible)
}
