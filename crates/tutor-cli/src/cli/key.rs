//! API key commands: set, clear, status.

use anyhow::Result;
use console::style;
use dialoguer::{Confirm, Password};

use tutor_core::chat::credential::mask_secret;
use tutor_core::storage::kv_store::CREDENTIAL_KEY;

use crate::state::AppState;

/// Save the API key with a hidden input prompt.
///
/// # Examples
///
/// ```bash
/// # Secure prompt (recommended)
/// tutor key set
///
/// # Script/automation mode
/// tutor key set --value AIza...
/// ```
pub async fn set_key(state: &AppState, value: Option<&str>, json: bool) -> Result<()> {
    let raw = match value {
        Some(v) => v.to_string(),
        None => Password::new()
            .with_prompt(format!("Enter your {} API key", style("Gemini").bold()))
            .interact()?,
    };

    let mut ctx = state.session().await?;
    state.controller.save_credential(&mut ctx, &raw).await?;

    let masked = ctx.credential().map(mask_secret).unwrap_or_default();
    if json {
        println!("{}", serde_json::json!({ "set": true, "masked": masked }));
    } else {
        println!(
            "  {} API key saved ({})",
            style("✓").green().bold(),
            masked
        );
    }

    Ok(())
}

/// Forget the saved API key. Conversations are kept.
pub async fn clear_key(state: &AppState, force: bool, json: bool) -> Result<()> {
    let mut ctx = state.session().await?;
    if !ctx.has_credential() {
        if json {
            println!("{}", serde_json::json!({ "cleared": false }));
        } else {
            println!("  {} No API key is saved.", style("i").blue().bold());
        }
        return Ok(());
    }

    if !force && !json {
        let confirmed = Confirm::new()
            .with_prompt("Remove the saved API key? Conversations are kept.")
            .default(false)
            .interact()?;
        if !confirmed {
            println!("  Cancelled.");
            return Ok(());
        }
    }

    state.controller.clear_credential(&mut ctx).await?;

    if json {
        println!("{}", serde_json::json!({ "cleared": true }));
    } else {
        println!("  {} API key removed", style("✓").green().bold());
    }
    Ok(())
}

/// Show whether a key is saved, masked.
pub async fn key_status(state: &AppState, json: bool) -> Result<()> {
    let ctx = state.session().await?;
    let masked = ctx.credential().map(mask_secret);
    let updated = state.kv.updated_at(CREDENTIAL_KEY).await?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "set": masked.is_some(),
                "masked": masked,
                "updated_at": updated,
                "data_dir": state.data_dir,
            }))?
        );
        return Ok(());
    }

    println!();
    match masked {
        Some(masked) => {
            println!("  {}  {}", style("API key:").bold(), style(masked).cyan());
            if let Some(updated) = updated {
                println!(
                    "  {}  {}",
                    style("Saved:").bold(),
                    style(updated.format("%Y-%m-%d %H:%M")).dim()
                );
            }
        }
        None => {
            println!(
                "  {} No API key saved. Add one with: {}",
                style("i").blue().bold(),
                style("tutor key set").yellow()
            );
        }
    }
    println!(
        "  {}  {}",
        style("Data dir:").bold(),
        style(state.data_dir.display()).dim()
    );
    println!();

    Ok(())
}
