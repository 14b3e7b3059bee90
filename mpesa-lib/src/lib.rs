//! M-Pesa storefront library.
//!
//! Client-side glue for a mobile storefront that takes M-Pesa C2B payments:
//!
//! - **Session keys**: fetched from an issuer function, cached in injected
//!   secure storage, reused until cleared ([`session`])
//! - **Gateway client**: authenticated OpenAPI calls with response-code
//!   checking and a one-shot refresh on 401 ([`gateway`])
//! - **Navigation guard**: decides between loading, auth redirect, and the
//!   Shop/Orders tabs ([`navigation`])
//!
//! The crate holds no global state. Storage is injected through
//! [`secure_storage::SecureKeyStorage`] so hosts can plug in their platform
//! keychain and tests can use [`secure_storage::InMemoryKeyStorage`].
//!
//! # Example
//!
//! ```no_run
//! use mpesa_lib::gateway::{MpesaClient, MpesaConfig};
//! use mpesa_lib::secure_storage::InMemoryKeyStorage;
//!
//! # async fn demo() -> mpesa_lib::Result<()> {
//! let config = MpesaConfig::vodacom_tanzania_sandbox("https://issuer.example/mpesa-checkout");
//! let client = MpesaClient::new(config, InMemoryKeyStorage::new())?;
//!
//! let envelope = client.initiate_c2b_payment("712345678", 1000, "order-42").await?;
//! println!("transaction id: {:?}", envelope.transaction_id());
//! # Ok(())
//! # }
//! ```

pub mod errors;
pub mod gateway;
pub mod navigation;
pub mod prelude;
pub mod secure_storage;
pub mod session;
mod transport;

/// Test utilities for simulating storage failures.
///
/// This module is only available with the `test-utils` feature or in test builds.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use errors::{MpesaError, MpesaErrorCode};

/// Common result alias for M-Pesa operations.
pub type Result<T> = std::result::Result<T, MpesaError>;
