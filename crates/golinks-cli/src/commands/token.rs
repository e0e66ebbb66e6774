//! `golinks token` — Mint an access token for a user.

use chrono::{Duration, Utc};
use golinks_core::state::AppState;

use super::print_json;

pub async fn run(
    state: &AppState,
    username: Option<&str>,
    description: &str,
    expires_in_days: Option<i64>,
) -> Result<(), String> {
    let user = match username {
        Some(name) => state
            .users
            .get_by_username(name)
            .await
            .map_err(|e| format!("Failed to look up user: {}", e))?
            .ok_or_else(|| format!("No user named '{}'", name))?,
        None => state
            .users
            .find_host()
            .await
            .map_err(|e| format!("Failed to look up host user: {}", e))?
            .ok_or_else(|| "No host user in this database".to_string())?,
    };

    let expires_at = match expires_in_days {
        Some(days) => {
            let delta =
                Duration::try_days(days).ok_or_else(|| "Expiry out of range".to_string())?;
            Some(
                Utc::now()
                    .checked_add_signed(delta)
                    .ok_or_else(|| "Expiry out of range".to_string())?,
            )
        }
        None => None,
    };

    let (raw, token) = state
        .auth
        .mint(user.id, description, expires_at)
        .await
        .map_err(|e| format!("Failed to mint token: {}", e))?;

    // The note goes to stderr so stdout stays pipeable JSON.
    eprintln!(
        "Minted token for {} ({}); the secret below is shown once.",
        user.username,
        user.role.as_str()
    );
    print_json(&serde_json::json!({
        "accessToken": raw,
        "token": token,
    }));
    Ok(())
}
