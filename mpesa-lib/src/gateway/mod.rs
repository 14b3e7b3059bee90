//! M-Pesa OpenAPI gateway client.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mpesa_lib::gateway::{MpesaClient, MpesaConfig};
//! use mpesa_lib::secure_storage::InMemoryKeyStorage;
//!
//! let config = MpesaConfig::vodacom_tanzania_sandbox(
//!     "https://<project>.supabase.co/functions/v1/mpesa-checkout",
//! );
//! let client = MpesaClient::new(config, InMemoryKeyStorage::new())?;
//!
//! // Fetches a session key on first use, then reuses the cached one.
//! let envelope = client.initiate_c2b_payment("712345678", 1000, "order-42").await?;
//! println!("conversation: {:?}", envelope.conversation_id());
//! ```
//!
//! ## Configuration
//!
//! Market codes, service provider code, and URLs come from [`MpesaConfig`];
//! see [`MpesaConfig::from_env`] for the environment variables it reads.

mod c2b;
mod client;
mod config;
mod envelope;

pub use c2b::{
    mask_phone, C2bPaymentRequest, C2bPayload, C2B_SINGLE_STAGE_PATH,
    DEFAULT_PURCHASED_ITEMS_DESC,
};
pub use client::MpesaClient;
pub use config::{MpesaConfig, VODACOM_TZ_OPENAPI_URL, VODACOM_TZ_SANDBOX_URL};
pub use envelope::{ResponseEnvelope, SUCCESS_CODE};

/// HTTP method accepted by [`MpesaClient::request`].
pub use reqwest::Method;
