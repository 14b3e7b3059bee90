//! Customer-to-Business single-stage payments.

use serde::Serialize;

use super::client::MpesaClient;
use super::config::MpesaConfig;
use super::envelope::ResponseEnvelope;
use crate::secure_storage::SecureKeyStorage;
use crate::transport::log_failure;
use crate::{MpesaError, Result};

/// Path of the single-stage C2B payment endpoint.
pub const C2B_SINGLE_STAGE_PATH: &str = "/c2bPayment/singleStage/";

/// Description used when the caller does not supply one.
pub const DEFAULT_PURCHASED_ITEMS_DESC: &str = "Cart Items";

/// A C2B payment the customer will confirm on their handset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct C2bPaymentRequest {
    /// Local phone number without the dialing prefix (e.g. `712345678`).
    pub phone_number: String,
    /// Amount in the configured currency's whole units.
    pub amount: u64,
    /// Caller-supplied idempotency reference; used for both the
    /// third-party conversation ID and the transaction reference.
    pub reference: String,
    /// Purchased items description.
    pub description: Option<String>,
}

/// Wire payload for [`C2B_SINGLE_STAGE_PATH`].
#[derive(Debug, Serialize)]
pub struct C2bPayload<'a> {
    #[serde(rename = "input_Amount")]
    pub amount: u64,
    #[serde(rename = "input_Country")]
    pub country: &'a str,
    #[serde(rename = "input_Currency")]
    pub currency: &'a str,
    #[serde(rename = "input_CustomerMSISDN")]
    pub customer_msisdn: String,
    #[serde(rename = "input_ServiceProviderCode")]
    pub service_provider_code: &'a str,
    #[serde(rename = "input_ThirdPartyConversationID")]
    pub third_party_conversation_id: &'a str,
    #[serde(rename = "input_TransactionReference")]
    pub transaction_reference: &'a str,
    #[serde(rename = "input_PurchasedItemsDesc")]
    pub purchased_items_desc: &'a str,
}

impl C2bPaymentRequest {
    /// Create a request with the default description.
    pub fn new(phone_number: impl Into<String>, amount: u64, reference: impl Into<String>) -> Self {
        Self {
            phone_number: phone_number.into(),
            amount,
            reference: reference.into(),
            description: None,
        }
    }

    /// Set the purchased items description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Reject requests the gateway would refuse anyway.
    pub fn validate(&self) -> Result<()> {
        if self.phone_number.is_empty() {
            return Err(MpesaError::invalid_data(
                "phone_number",
                "cannot be empty",
            ));
        }
        if !self.phone_number.chars().all(|c| c.is_ascii_digit()) {
            return Err(MpesaError::invalid_data(
                "phone_number",
                "must contain digits only",
            ));
        }
        if self.amount == 0 {
            return Err(MpesaError::invalid_data(
                "amount",
                "must be greater than zero",
            ));
        }
        if self.reference.trim().is_empty() {
            return Err(MpesaError::invalid_data("reference", "cannot be empty"));
        }
        Ok(())
    }

    /// Full international number: the configured prefix followed by the local number.
    pub fn msisdn(&self, config: &MpesaConfig) -> String {
        format!("{}{}", config.msisdn_prefix, self.phone_number)
    }

    /// Build the wire payload using the market settings from `config`.
    pub fn to_payload<'a>(&'a self, config: &'a MpesaConfig) -> C2bPayload<'a> {
        C2bPayload {
            amount: self.amount,
            country: &config.country_code,
            currency: &config.currency_code,
            customer_msisdn: self.msisdn(config),
            service_provider_code: &config.service_provider_code,
            third_party_conversation_id: &self.reference,
            transaction_reference: &self.reference,
            purchased_items_desc: self
                .description
                .as_deref()
                .unwrap_or(DEFAULT_PURCHASED_ITEMS_DESC),
        }
    }
}

/// Hide all but the last three digits of a phone number.
pub fn mask_phone(phone: &str) -> String {
    let len = phone.chars().count();
    if len <= 3 {
        return "*".repeat(len);
    }
    let tail: String = phone.chars().skip(len - 3).collect();
    format!("{}{}", "*".repeat(len - 3), tail)
}

impl<S: SecureKeyStorage> MpesaClient<S> {
    /// Initiate a C2B payment.
    ///
    /// ```rust,ignore
    /// let envelope = client.initiate_c2b_payment("712345678", 1000, "ref-1").await?;
    /// println!("transaction: {:?}", envelope.transaction_id());
    /// ```
    pub async fn initiate_c2b_payment(
        &self,
        phone_number: &str,
        amount: u64,
        reference: &str,
    ) -> Result<ResponseEnvelope> {
        self.submit_c2b_payment(&C2bPaymentRequest::new(phone_number, amount, reference))
            .await
    }

    /// Submit a prepared C2B payment request.
    #[cfg_attr(feature = "tracing", tracing::instrument(
        skip(self, request),
        fields(msisdn = %mask_phone(&request.phone_number), amount = request.amount, reference = %request.reference)
    ))]
    pub async fn submit_c2b_payment(&self, request: &C2bPaymentRequest) -> Result<ResponseEnvelope> {
        let result = match request.validate() {
            Ok(()) => {
                let payload = request.to_payload(self.config());
                self.post(C2B_SINGLE_STAGE_PATH, &payload).await
            }
            Err(e) => Err(e),
        };

        if let Err(e) = &result {
            log_failure("Error initiating C2B payment", e);
        }
        result
    }
}
