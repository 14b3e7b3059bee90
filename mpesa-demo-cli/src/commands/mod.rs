//! CLI command implementations

pub mod config;
pub mod pay;
pub mod request;
pub mod session;
pub mod tabs;

use mpesa_lib::gateway::{MpesaClient, ResponseEnvelope};

use crate::storage::FileKeyStorage;
use crate::ui;

/// Build a gateway client from the stored configuration and key file.
pub fn load_client(storage_dir: &std::path::Path) -> anyhow::Result<MpesaClient<FileKeyStorage>> {
    let config = config::resolve(storage_dir)?;
    let client = MpesaClient::new(config, FileKeyStorage::new(storage_dir))?;
    Ok(client)
}

/// Print the well-known envelope fields, then the whole body when verbose.
pub fn print_envelope(envelope: &ResponseEnvelope, verbose: bool) -> anyhow::Result<()> {
    if let Some(code) = &envelope.response_code {
        ui::key_value("Response code", code);
    }
    if let Some(desc) = &envelope.response_desc {
        ui::key_value("Description", desc);
    }
    if let Some(id) = envelope.transaction_id() {
        ui::key_value("Transaction ID", id);
    }
    if let Some(id) = envelope.conversation_id() {
        ui::key_value("Conversation ID", id);
    }
    if let Some(id) = envelope.third_party_conversation_id() {
        ui::key_value("Third-party conversation ID", id);
    }

    if verbose {
        ui::separator();
        ui::json(&serde_json::to_value(envelope)?);
    }
    Ok(())
}
