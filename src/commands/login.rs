use anyhow::Result;

use crate::commands::context::AppContext;
use crate::storage::SettingsStore;
use crate::storage::settings_store::{KEY_HASH_CODE, validate_allowance};

const HASH_CODE_HELP: &str = "The Hash Code is available in your control panel at http://www.aquiss.net";

pub async fn handle_login_command(
    ctx: &AppContext,
    hash_code: &str,
    allowance_gib: f64,
    json_output: bool,
) -> Result<()> {
    validate_allowance(allowance_gib)?;

    let hash_code = hash_code.trim();
    if hash_code.is_empty() {
        anyhow::bail!("Hash code must not be empty. {}", HASH_CODE_HELP);
    }

    let client = ctx.client()?;
    if !client.validate_hash_code(hash_code).await {
        anyhow::bail!(
            "The Hash Code you entered is incorrect, please double-check the code you entered. {}",
            HASH_CODE_HELP
        );
    }

    let previous = ctx.store.hash_code()?;
    ctx.store.set(KEY_HASH_CODE, hash_code)?;
    ctx.store.set_allowance(allowance_gib)?;

    // Notification history belongs to the previous account
    if previous.as_deref() != Some(hash_code) {
        ctx.store.clear_notification_state()?;
    }

    tracing::info!(allowance_gib, "logged in");
    if json_output {
        println!(
            "{}",
            serde_json::json!({
                "status": "success",
                "message": "Logged in",
                "allowance_gib": allowance_gib,
            })
        );
    } else {
        println!("Logged in. Allowance set to {} GB.", allowance_gib);
    }

    Ok(())
}

pub fn handle_logout_command(ctx: &AppContext, json_output: bool) -> Result<()> {
    clear_login(&ctx.store)?;

    if json_output {
        println!(r#"{{"status": "success", "message": "Logged out"}}"#);
    } else {
        println!("Logged out. Saved hash code removed.");
    }

    Ok(())
}

/// Forget the hash code and the notification history tied to it; the allowance is kept
pub fn clear_login(store: &SettingsStore) -> Result<()> {
    store.remove(KEY_HASH_CODE)?;
    store.clear_notification_state()?;
    tracing::info!("logged out");
    Ok(())
}
