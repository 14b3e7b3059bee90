//! Gateway configuration commands
//!
//! The gateway configuration lives in `<storage_dir>/config.json`. At run time
//! any `MPESA_*` environment variables are layered on top of it.

use anyhow::{Context, Result};
use mpesa_lib::gateway::{MpesaConfig, VODACOM_TZ_OPENAPI_URL, VODACOM_TZ_SANDBOX_URL};
use std::path::{Path, PathBuf};

use crate::ui;

const CONFIG_FILE: &str = "config.json";

/// Values accepted by `config set`. `None` leaves the stored value untouched.
#[derive(Debug, Default)]
pub struct ConfigUpdate {
    pub preset: Option<String>,
    pub token_issuer_url: Option<String>,
    pub endpoint_base_url: Option<String>,
    pub service_provider_code: Option<String>,
    pub country_code: Option<String>,
    pub currency_code: Option<String>,
    pub msisdn_prefix: Option<String>,
    pub timeout_secs: Option<u64>,
    pub retry_on_expired_session: Option<bool>,
}

fn config_path(storage_dir: &Path) -> PathBuf {
    storage_dir.join(CONFIG_FILE)
}

/// Load the stored gateway configuration from disk
pub fn load(storage_dir: &Path) -> Result<Option<MpesaConfig>> {
    let path = config_path(storage_dir);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path).context("Failed to read gateway configuration")?;
    let config: MpesaConfig =
        serde_json::from_str(&contents).context("Failed to parse gateway configuration")?;
    Ok(Some(config))
}

/// Save the gateway configuration to disk
pub fn save(config: &MpesaConfig, storage_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(storage_dir)?;
    let contents =
        serde_json::to_string_pretty(config).context("Failed to serialize gateway config")?;
    std::fs::write(config_path(storage_dir), contents)
        .context("Failed to write gateway configuration")?;
    Ok(())
}

/// Effective configuration: file, then environment.
pub fn resolve(storage_dir: &Path) -> Result<MpesaConfig> {
    let config = match load(storage_dir)? {
        Some(config) => config.merge_env(),
        None => MpesaConfig::from_env().ok_or_else(|| {
            anyhow::anyhow!(
                "No gateway configured. Run 'mpesa-demo config set --token-issuer-url <url>' \
                 or set MPESA_TOKEN_ISSUER_URL."
            )
        })?,
    };
    config.validate().context("Invalid gateway configuration")?;
    Ok(config)
}

/// Apply `update` on top of `base` (or a fresh config when there is none).
pub fn apply(base: Option<MpesaConfig>, update: ConfigUpdate) -> Result<MpesaConfig> {
    let mut config = match (base, update.token_issuer_url.clone()) {
        (Some(config), _) => config,
        (None, Some(url)) => MpesaConfig::new(url),
        (None, None) => anyhow::bail!("--token-issuer-url is required for a new configuration"),
    };

    if let Some(preset) = update.preset.as_deref() {
        config.endpoint_base_url = match preset.to_lowercase().as_str() {
            "sandbox" => VODACOM_TZ_SANDBOX_URL.to_string(),
            "production" | "openapi" => VODACOM_TZ_OPENAPI_URL.to_string(),
            _ => anyhow::bail!("Unknown preset: {}. Available: sandbox, production", preset),
        };
    }

    if let Some(url) = update.token_issuer_url {
        config.token_issuer_url = url;
    }
    if let Some(url) = update.endpoint_base_url {
        config.endpoint_base_url = url;
    }
    if let Some(code) = update.service_provider_code {
        config.service_provider_code = code;
    }
    if let Some(code) = update.country_code {
        config.country_code = code;
    }
    if let Some(code) = update.currency_code {
        config.currency_code = code;
    }
    if let Some(prefix) = update.msisdn_prefix {
        config.msisdn_prefix = prefix;
    }
    if let Some(secs) = update.timeout_secs {
        config.timeout_secs = secs;
    }
    if let Some(enabled) = update.retry_on_expired_session {
        config.retry_on_expired_session = enabled;
    }

    config.validate()?;
    Ok(config)
}

/// Persist configuration changes
pub async fn set(storage_dir: &Path, update: ConfigUpdate, _verbose: bool) -> Result<()> {
    ui::header("Configure Gateway");

    let config = apply(load(storage_dir)?, update)?;
    save(&config, storage_dir)?;

    ui::success("Gateway configuration saved");
    print_config(&config);
    Ok(())
}

/// Show the effective configuration
pub async fn show(storage_dir: &Path, as_json: bool, _verbose: bool) -> Result<()> {
    let stored = load(storage_dir)?;
    let config = match stored.clone() {
        Some(config) => Some(config.merge_env()),
        None => MpesaConfig::from_env(),
    };

    let Some(config) = config else {
        ui::header("Gateway Configuration");
        ui::warning("No gateway configured");
        ui::info("");
        ui::info("Configure the gateway with:");
        ui::info("  mpesa-demo config set --token-issuer-url <url>");
        ui::info("  mpesa-demo config set --token-issuer-url <url> --preset production");
        return Ok(());
    };

    if as_json {
        ui::json(&serde_json::to_value(&config)?);
        return Ok(());
    }

    ui::header("Gateway Configuration");
    print_config(&config);
    ui::separator();
    if stored.is_some_and(|s| s != config) {
        ui::info("Environment overrides applied");
    }
    if let Err(e) = config.validate() {
        ui::warning(&format!("Configuration is invalid: {}", e));
    }
    Ok(())
}

/// Remove the stored configuration
pub async fn clear(storage_dir: &Path, _verbose: bool) -> Result<()> {
    ui::header("Clear Gateway Configuration");

    let path = config_path(storage_dir);
    if path.exists() {
        std::fs::remove_file(&path)?;
        ui::success("Gateway configuration cleared");
    } else {
        ui::info("No gateway configuration to clear");
    }

    Ok(())
}

fn print_config(config: &MpesaConfig) {
    ui::key_value("Endpoint", &config.endpoint_base_url);
    ui::key_value("Token issuer", &config.token_issuer_url);
    ui::key_value("Service provider", &config.service_provider_code);
    ui::key_value(
        "Market",
        &format!("{} / {}", config.country_code, config.currency_code),
    );
    ui::key_value("MSISDN prefix", &config.msisdn_prefix);
    ui::key_value("Timeout", &format!("{}s", config.timeout_secs));
    ui::key_value(
        "Retry on expired session",
        if config.retry_on_expired_session { "yes" } else { "no" },
    );
}
