//! Session key commands

use anyhow::{Context, Result};
use mpesa_lib::secure_storage::SecureKeyStorage;
use mpesa_lib::session::SESSION_KEY_STORAGE_KEY;
use std::path::Path;

use crate::storage::FileKeyStorage;
use crate::ui;

/// Acquire a session key (cached or freshly issued)
pub async fn fetch(storage_dir: &Path, verbose: bool) -> Result<()> {
    ui::header("Session Key");

    let client = super::load_client(storage_dir)?;
    let was_cached = client.session().cached().await?.is_some();

    let spinner = ui::spinner("Acquiring session key...");
    let result = client.acquire_session_key().await;
    spinner.finish_and_clear();

    let key = result.context("Failed to acquire session key")?;
    if was_cached {
        ui::success("Using cached session key");
    } else {
        ui::success("Session key issued and cached");
    }
    ui::key_value("Key", &key.masked());
    if verbose {
        ui::key_value("Issuer", client.session().issuer_url());
        ui::key_value("Stored in", &client.session().storage().path().display().to_string());
    }
    Ok(())
}

/// Forget the cached session key
pub async fn clear(storage_dir: &Path, _verbose: bool) -> Result<()> {
    ui::header("Clear Session Key");

    let storage = FileKeyStorage::new(storage_dir);
    let had_key = storage.exists(SESSION_KEY_STORAGE_KEY).await?;

    let client = super::load_client(storage_dir)?;
    client
        .clear_session_key()
        .await
        .context("Failed to clear session key")?;

    if had_key {
        ui::success("Session key cleared");
    } else {
        ui::info("No session key to clear");
    }
    Ok(())
}

/// Report whether a session key is cached
pub async fn status(storage_dir: &Path, _verbose: bool) -> Result<()> {
    ui::header("Session Status");

    let client = super::load_client(storage_dir)?;
    match client.session().cached().await? {
        Some(key) => {
            ui::success("Session key cached");
            ui::key_value("Key", &key.masked());
        }
        None => {
            ui::warning("No session key cached");
            ui::info("Run 'mpesa-demo session fetch' to acquire one");
        }
    }
    Ok(())
}
