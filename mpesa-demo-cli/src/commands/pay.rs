//! C2B payment command

use anyhow::{Context, Result};
use mpesa_lib::gateway::{mask_phone, C2bPaymentRequest};
use std::path::Path;

use crate::ui;

/// Build the payment request, generating a reference when none is given.
pub fn build_request(
    phone: &str,
    amount: u64,
    reference: Option<String>,
    description: Option<String>,
) -> C2bPaymentRequest {
    let reference = reference.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let request = C2bPaymentRequest::new(phone, amount, reference);
    match description {
        Some(desc) => request.with_description(desc),
        None => request,
    }
}

/// Initiate a C2B single-stage payment
pub async fn run(
    storage_dir: &Path,
    phone: &str,
    amount: u64,
    reference: Option<String>,
    description: Option<String>,
    verbose: bool,
) -> Result<()> {
    ui::header("C2B Payment");

    let request = build_request(phone, amount, reference, description);
    request.validate()?;

    let client = super::load_client(storage_dir)?;
    let config = client.config();

    ui::key_value("Customer", &mask_phone(&request.msisdn(config)));
    ui::key_value(
        "Amount",
        &format!("{} {}", request.amount, config.currency_code),
    );
    ui::key_value("Reference", &request.reference);
    ui::separator();

    tracing::debug!(reference = %request.reference, "Submitting C2B payment");
    let spinner = ui::spinner("Waiting for the customer to confirm on their handset...");
    let result = client.submit_c2b_payment(&request).await;
    spinner.finish_and_clear();

    match result {
        Ok(envelope) => {
            ui::success("Payment accepted");
            super::print_envelope(&envelope, verbose)?;
            Ok(())
        }
        Err(e) => {
            ui::error(&format!("Payment failed: {}", e));
            Err(e).context("C2B payment was not completed")
        }
    }
}
