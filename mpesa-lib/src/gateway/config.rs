//! Configuration for the M-Pesa gateway client.
//!
//! # Environment Variables
//!
//! [`MpesaConfig::from_env`] reads:
//! - `MPESA_TOKEN_ISSUER_URL` - session key issuer (required)
//! - `MPESA_ENDPOINT_BASE_URL` - OpenAPI base URL
//! - `MPESA_SERVICE_PROVIDER_CODE` - business short code
//! - `MPESA_COUNTRY_CODE` - e.g. `TZN`
//! - `MPESA_CURRENCY_CODE` - e.g. `TZS`
//! - `MPESA_MSISDN_PREFIX` - dialing prefix prepended to phone numbers
//! - `MPESA_TIMEOUT` - request timeout in seconds
//! - `MPESA_RETRY_ON_EXPIRED` - `true`/`false`

use serde::{Deserialize, Serialize};

use crate::{MpesaError, Result};

/// Vodacom Tanzania sandbox base URL.
pub const VODACOM_TZ_SANDBOX_URL: &str = "https://openapi.m-pesa.com/sandbox/ipg/v2/vodacomTZN";

/// Vodacom Tanzania production base URL.
pub const VODACOM_TZ_OPENAPI_URL: &str = "https://openapi.m-pesa.com/openapi/ipg/v2/vodacomTZN";

/// Configuration for [`MpesaClient`](super::MpesaClient).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MpesaConfig {
    /// OpenAPI base URL; endpoint paths are appended to it.
    #[serde(default = "default_endpoint_base_url")]
    pub endpoint_base_url: String,

    /// URL of the function that issues session keys (`GET`).
    pub token_issuer_url: String,

    /// Service provider (business short) code.
    #[serde(default = "default_service_provider_code")]
    pub service_provider_code: String,

    /// Three-letter market code sent as `input_Country`.
    #[serde(default = "default_country_code")]
    pub country_code: String,

    /// ISO currency sent as `input_Currency`.
    #[serde(default = "default_currency_code")]
    pub currency_code: String,

    /// Dialing prefix prepended to local phone numbers.
    #[serde(default = "default_msisdn_prefix")]
    pub msisdn_prefix: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Refresh the session key and retry once when the gateway answers 401.
    #[serde(default = "default_retry_on_expired")]
    pub retry_on_expired_session: bool,
}

fn default_endpoint_base_url() -> String {
    VODACOM_TZ_SANDBOX_URL.to_string()
}

fn default_service_provider_code() -> String {
    "000000".to_string()
}

fn default_country_code() -> String {
    "TZN".to_string()
}

fn default_currency_code() -> String {
    "TZS".to_string()
}

fn default_msisdn_prefix() -> String {
    "255".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_retry_on_expired() -> bool {
    true
}

impl MpesaConfig {
    /// Create a configuration with defaults for everything but the issuer URL.
    pub fn new(token_issuer_url: impl Into<String>) -> Self {
        Self {
            endpoint_base_url: default_endpoint_base_url(),
            token_issuer_url: token_issuer_url.into(),
            service_provider_code: default_service_provider_code(),
            country_code: default_country_code(),
            currency_code: default_currency_code(),
            msisdn_prefix: default_msisdn_prefix(),
            timeout_secs: default_timeout(),
            retry_on_expired_session: default_retry_on_expired(),
        }
    }

    /// Vodacom Tanzania sandbox.
    pub fn vodacom_tanzania_sandbox(token_issuer_url: impl Into<String>) -> Self {
        Self::new(token_issuer_url)
    }

    /// Vodacom Tanzania production.
    pub fn vodacom_tanzania_production(
        token_issuer_url: impl Into<String>,
        service_provider_code: impl Into<String>,
    ) -> Self {
        Self::new(token_issuer_url)
            .with_endpoint_base_url(VODACOM_TZ_OPENAPI_URL)
            .with_service_provider_code(service_provider_code)
    }

    /// Load configuration from environment variables.
    ///
    /// Returns `None` when `MPESA_TOKEN_ISSUER_URL` is unset.
    pub fn from_env() -> Option<Self> {
        let issuer = std::env::var("MPESA_TOKEN_ISSUER_URL").ok()?;
        Some(Self::new(issuer).merge_env())
    }

    /// Apply any `MPESA_*` environment overrides on top of `self`.
    pub fn merge_env(mut self) -> Self {
        if let Ok(url) = std::env::var("MPESA_TOKEN_ISSUER_URL") {
            self.token_issuer_url = url;
        }
        if let Ok(url) = std::env::var("MPESA_ENDPOINT_BASE_URL") {
            self.endpoint_base_url = url;
        }
        if let Ok(code) = std::env::var("MPESA_SERVICE_PROVIDER_CODE") {
            self.service_provider_code = code;
        }
        if let Ok(code) = std::env::var("MPESA_COUNTRY_CODE") {
            self.country_code = code;
        }
        if let Ok(code) = std::env::var("MPESA_CURRENCY_CODE") {
            self.currency_code = code;
        }
        if let Ok(prefix) = std::env::var("MPESA_MSISDN_PREFIX") {
            self.msisdn_prefix = prefix;
        }
        if let Ok(timeout) = std::env::var("MPESA_TIMEOUT") {
            if let Ok(secs) = timeout.parse::<u64>() {
                self.timeout_secs = secs;
            }
        }
        if let Ok(retry) = std::env::var("MPESA_RETRY_ON_EXPIRED") {
            if let Ok(enabled) = retry.parse::<bool>() {
                self.retry_on_expired_session = enabled;
            }
        }
        self
    }

    /// Set the OpenAPI base URL.
    pub fn with_endpoint_base_url(mut self, url: impl Into<String>) -> Self {
        self.endpoint_base_url = url.into();
        self
    }

    /// Set the service provider code.
    pub fn with_service_provider_code(mut self, code: impl Into<String>) -> Self {
        self.service_provider_code = code.into();
        self
    }

    /// Set the market and currency codes.
    pub fn with_market(mut self, country: impl Into<String>, currency: impl Into<String>) -> Self {
        self.country_code = country.into();
        self.currency_code = currency.into();
        self
    }

    /// Set the MSISDN dialing prefix.
    pub fn with_msisdn_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.msisdn_prefix = prefix.into();
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Enable or disable the one-shot retry on an expired session key.
    pub fn with_retry_on_expired_session(mut self, enabled: bool) -> Self {
        self.retry_on_expired_session = enabled;
        self
    }

    /// Reject configurations the client cannot work with.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("endpoint_base_url", &self.endpoint_base_url),
            ("token_issuer_url", &self.token_issuer_url),
        ] {
            if value.is_empty() {
                return Err(MpesaError::invalid_data(field, "URL cannot be empty"));
            }
            if !is_http_url(value) {
                return Err(MpesaError::invalid_data(
                    field,
                    format!("expected an http(s) URL, got {value}"),
                ));
            }
        }
        for (field, value) in [
            ("service_provider_code", &self.service_provider_code),
            ("country_code", &self.country_code),
            ("currency_code", &self.currency_code),
        ] {
            if value.trim().is_empty() {
                return Err(MpesaError::invalid_data(field, "cannot be empty"));
            }
        }
        if !self.msisdn_prefix.chars().all(|c| c.is_ascii_digit()) {
            return Err(MpesaError::invalid_data(
                "msisdn_prefix",
                "must contain digits only",
            ));
        }
        if self.timeout_secs == 0 {
            return Err(MpesaError::invalid_data(
                "timeout_secs",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}

pub(crate) fn is_http_url(value: &str) -> bool {
    value.starts_with("https://") || value.starts_with("http://")
}
