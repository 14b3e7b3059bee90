//! HTTP plumbing shared by the session key cache and the gateway client.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, ORIGIN};

use crate::session::SessionKey;
use crate::{MpesaError, Result};

/// Build a `reqwest` client bounded by `timeout_secs`.
pub(crate) fn build_http_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| MpesaError::Transport(format!("Failed to build HTTP client: {}", e)))
}

/// Headers attached to every authenticated gateway call.
pub(crate) fn authenticated_headers(key: &SessionKey) -> Result<HeaderMap> {
    let mut map = HeaderMap::new();
    map.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    let mut bearer = HeaderValue::from_str(&key.bearer())
        .map_err(|_| MpesaError::invalid_data("session key", "not a valid header value"))?;
    bearer.set_sensitive(true);
    map.insert(AUTHORIZATION, bearer);
    map.insert(ORIGIN, HeaderValue::from_static("*"));
    Ok(map)
}

/// Headers for the unauthenticated session key request.
pub(crate) fn issuer_headers() -> HeaderMap {
    let mut map = HeaderMap::new();
    map.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    map
}

/// Map a non-success status to [`MpesaError::Http`].
pub(crate) fn status_error(operation: &'static str, status: reqwest::StatusCode) -> MpesaError {
    MpesaError::Http {
        operation,
        status: status.as_u16(),
        status_text: status
            .canonical_reason()
            .map(str::to_string)
            .unwrap_or_else(|| status.as_str().to_string()),
    }
}

/// Map reqwest errors to [`MpesaError`].
pub(crate) fn map_reqwest_error(
    operation: &'static str,
    target: &str,
    timeout_secs: u64,
    e: reqwest::Error,
) -> MpesaError {
    if e.is_timeout() {
        MpesaError::ConnectionTimeout {
            operation: operation.to_string(),
            timeout_ms: timeout_secs * 1000,
        }
    } else if e.is_connect() {
        MpesaError::ConnectionFailed {
            target: target.to_string(),
            reason: e.to_string(),
        }
    } else if e.is_decode() {
        MpesaError::Serialization(format!("{operation}: failed to decode response body: {e}"))
    } else {
        MpesaError::Transport(format!("{operation}: {e}"))
    }
}

/// Log a failure at the point it is caught, before it is handed back.
pub(crate) fn log_failure(context: &str, err: &MpesaError) {
    #[cfg(feature = "tracing")]
    tracing::error!(error = %err, code = ?err.code(), "{context}");
    #[cfg(not(feature = "tracing"))]
    eprintln!("{context}: {err}");
}
