//! Raw authenticated gateway request

use anyhow::{Context, Result};
use mpesa_lib::gateway::Method;
use std::path::Path;

use crate::ui;

/// Parse a method name such as `get` or `POST`.
pub fn parse_method(name: &str) -> Result<Method> {
    name.to_uppercase()
        .parse::<Method>()
        .with_context(|| format!("Invalid HTTP method: {}", name))
}

/// Parse an optional JSON request body.
pub fn parse_body(body: Option<&str>) -> Result<Option<serde_json::Value>> {
    body.map(|raw| serde_json::from_str(raw).context("Request body is not valid JSON"))
        .transpose()
}

/// Send an authenticated request and print the response envelope
pub async fn run(
    storage_dir: &Path,
    endpoint: &str,
    method: &str,
    body: Option<&str>,
    verbose: bool,
) -> Result<()> {
    let method = parse_method(method)?;
    let body = parse_body(body)?;

    let client = super::load_client(storage_dir)?;
    let url = client.url(endpoint);
    ui::header(&format!("{} {}", method, url));

    let spinner = ui::spinner("Calling gateway...");
    let result = client.request(method, endpoint, body.as_ref()).await;
    spinner.finish_and_clear();

    let envelope = result.context("Gateway request failed")?;
    ui::success("Gateway accepted the request");
    super::print_envelope(&envelope, verbose)
}
