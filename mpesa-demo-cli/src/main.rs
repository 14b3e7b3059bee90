//! M-Pesa Demo CLI
//!
//! Command-line interface for exercising the M-Pesa storefront client:
//! session keys, C2B payments, raw gateway calls and the navigation guard.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod storage;
mod ui;

const STORAGE_DIR_ENV: &str = "MPESA_DEMO_DIR";

#[derive(Parser)]
#[command(name = "mpesa-demo")]
#[command(about = "M-Pesa Demo CLI - Test the C2B payment client and storefront guard", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Custom storage directory (can also be set via MPESA_DEMO_DIR env var)
    #[arg(long, global = true)]
    storage_dir: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the cached session key
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },

    /// Initiate a C2B payment
    Pay {
        /// Customer phone number without the country prefix (e.g. 712345678)
        #[arg(short, long)]
        phone: String,

        /// Amount in whole currency units
        #[arg(short, long)]
        amount: u64,

        /// Transaction reference (defaults to a random UUID)
        #[arg(short, long)]
        reference: Option<String>,

        /// Purchased items description
        #[arg(short, long)]
        description: Option<String>,
    },

    /// Send a raw authenticated request to the gateway
    Request {
        /// Endpoint path relative to the base URL, or an absolute URL
        endpoint: String,

        /// HTTP method
        #[arg(short, long, default_value = "GET")]
        method: String,

        /// JSON request body
        #[arg(short, long)]
        body: Option<String>,
    },

    /// Inspect or change gateway configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Preview the storefront navigation guard
    Tabs {
        /// Auth provider is still determining the session
        #[arg(long)]
        mounting: bool,

        /// A session is present
        #[arg(long)]
        signed_in: bool,

        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum SessionAction {
    /// Acquire a session key (cached or freshly issued)
    Fetch,

    /// Clear the cached session key
    Clear,

    /// Show whether a session key is cached
    Status,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Update and persist the configuration
    Set {
        /// Endpoint preset (sandbox, production)
        #[arg(long)]
        preset: Option<String>,

        /// Session key issuer URL
        #[arg(long)]
        token_issuer_url: Option<String>,

        /// OpenAPI base URL
        #[arg(long)]
        endpoint_base_url: Option<String>,

        /// Service provider (business short) code
        #[arg(long)]
        service_provider_code: Option<String>,

        /// Market code (e.g. TZN)
        #[arg(long)]
        country: Option<String>,

        /// Currency code (e.g. TZS)
        #[arg(long)]
        currency: Option<String>,

        /// Dialing prefix prepended to phone numbers
        #[arg(long)]
        msisdn_prefix: Option<String>,

        /// Request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Refresh the key and retry once on 401 (true/false)
        #[arg(long)]
        retry_on_expired: Option<bool>,
    },

    /// Remove the stored configuration
    Clear,
}

fn storage_dir(flag: Option<String>) -> PathBuf {
    if let Some(dir) = flag {
        return PathBuf::from(dir);
    }
    if let Some(dir) = std::env::var_os(STORAGE_DIR_ENV) {
        return PathBuf::from(dir);
    }
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mpesa-demo")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter("mpesa_demo_cli=debug,mpesa_lib=debug")
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter("mpesa_demo_cli=info,mpesa_lib=warn")
            .init();
    }

    let storage_dir = storage_dir(cli.storage_dir);
    tracing::debug!(dir = %storage_dir.display(), "Using storage directory");

    // Dispatch commands
    match cli.command {
        Commands::Session { action } => match action {
            SessionAction::Fetch => {
                commands::session::fetch(&storage_dir, cli.verbose).await?;
            }
            SessionAction::Clear => {
                commands::session::clear(&storage_dir, cli.verbose).await?;
            }
            SessionAction::Status => {
                commands::session::status(&storage_dir, cli.verbose).await?;
            }
        },
        Commands::Pay {
            phone,
            amount,
            reference,
            description,
        } => {
            commands::pay::run(
                &storage_dir,
                &phone,
                amount,
                reference,
                description,
                cli.verbose,
            )
            .await?;
        }
        Commands::Request {
            endpoint,
            method,
            body,
        } => {
            commands::request::run(&storage_dir, &endpoint, &method, body.as_deref(), cli.verbose)
                .await?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { json } => {
                commands::config::show(&storage_dir, json, cli.verbose).await?;
            }
            ConfigAction::Set {
                preset,
                token_issuer_url,
                endpoint_base_url,
                service_provider_code,
                country,
                currency,
                msisdn_prefix,
                timeout,
                retry_on_expired,
            } => {
                let update = commands::config::ConfigUpdate {
                    preset,
                    token_issuer_url,
                    endpoint_base_url,
                    service_provider_code,
                    country_code: country,
                    currency_code: currency,
                    msisdn_prefix,
                    timeout_secs: timeout,
                    retry_on_expired_session: retry_on_expired,
                };
                commands::config::set(&storage_dir, update, cli.verbose).await?;
            }
            ConfigAction::Clear => {
                commands::config::clear(&storage_dir, cli.verbose).await?;
            }
        },
        Commands::Tabs {
            mounting,
            signed_in,
            json,
        } => {
            commands::tabs::run(mounting, signed_in, json, cli.verbose).await?;
        }
    }

    Ok(())
}
