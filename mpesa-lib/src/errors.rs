//! Error types for M-Pesa client operations.
//!
//! Every failure the client can observe falls into one of four groups:
//! storage access, transport, malformed responses, and gateway-level
//! rejections carried inside an otherwise successful HTTP response.

use thiserror::Error;

use crate::secure_storage::SecureStorageError;

/// Fallback message when the gateway rejects a request without a description.
pub const GENERIC_API_ERROR: &str = "M-Pesa API error";

/// Error codes for FFI and mobile integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum MpesaErrorCode {
    /// Transport/network layer error
    Transport = 2000,
    /// Connection failed
    ConnectionFailed = 2001,
    /// Connection timeout
    ConnectionTimeout = 2002,
    /// Non-success HTTP status
    Http = 2003,
    /// Session key rejected by the gateway
    SessionExpired = 3001,
    /// Required response field missing
    MissingField = 4000,
    /// Invalid request/configuration data
    InvalidData = 5000,
    /// Serialization error
    Serialization = 5002,
    /// Gateway rejected the request
    Api = 6000,
    /// Storage error
    Storage = 7000,
}

/// Error type for M-Pesa client operations.
#[derive(Debug, Error)]
pub enum MpesaError {
    /// Secure storage could not be read or written.
    #[error("storage error: {0}")]
    Storage(#[from] SecureStorageError),

    /// Transport/network layer error.
    #[error("transport error: {0}")]
    Transport(String),

    /// Connection failed.
    #[error("connection to {target} failed: {reason}")]
    ConnectionFailed {
        /// Target URL
        target: String,
        /// Underlying error message
        reason: String,
    },

    /// Connection timeout.
    #[error("{operation} timed out after {timeout_ms}ms")]
    ConnectionTimeout {
        /// Operation that timed out
        operation: String,
        /// Timeout duration in milliseconds
        timeout_ms: u64,
    },

    /// The server answered with a non-2xx status.
    #[error("{operation} failed: {status_text}")]
    Http {
        /// What was being attempted
        operation: &'static str,
        /// HTTP status code
        status: u16,
        /// Canonical reason phrase for the status
        status_text: String,
    },

    /// The gateway kept rejecting the session key after a refresh.
    #[error("session key rejected by the gateway")]
    SessionExpired,

    /// A field the protocol requires was absent or empty.
    #[error("{field} not found in response")]
    MissingField {
        /// Name of the missing field
        field: &'static str,
    },

    /// Response body could not be parsed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The gateway answered 2xx but with a non-success response code.
    ///
    /// Displays as the gateway-supplied description alone.
    #[error("{description}")]
    Api {
        /// `output_ResponseCode` as returned, if any
        code: Option<String>,
        /// `output_ResponseDesc`, or [`GENERIC_API_ERROR`]
        description: String,
    },

    /// Caller-supplied data failed validation.
    #[error("invalid {field}: {reason}")]
    InvalidData {
        /// Field or parameter name
        field: String,
        /// Reason for invalidity
        reason: String,
    },
}

impl MpesaError {
    /// Get the error code for FFI/mobile integration.
    pub fn code(&self) -> MpesaErrorCode {
        match self {
            Self::Storage(_) => MpesaErrorCode::Storage,
            Self::Transport(_) => MpesaErrorCode::Transport,
            Self::ConnectionFailed { .. } => MpesaErrorCode::ConnectionFailed,
            Self::ConnectionTimeout { .. } => MpesaErrorCode::ConnectionTimeout,
            Self::Http { .. } => MpesaErrorCode::Http,
            Self::SessionExpired => MpesaErrorCode::SessionExpired,
            Self::MissingField { .. } => MpesaErrorCode::MissingField,
            Self::Serialization(_) => MpesaErrorCode::Serialization,
            Self::Api { .. } => MpesaErrorCode::Api,
            Self::InvalidData { .. } => MpesaErrorCode::InvalidData,
        }
    }

    /// Returns true if this error is potentially recoverable by retrying.
    ///
    /// The client never acts on this itself; it is a hint for callers.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_)
            | Self::ConnectionFailed { .. }
            | Self::ConnectionTimeout { .. }
            | Self::SessionExpired => true,
            Self::Http { status, .. } => *status == 429 || *status >= 500,
            Self::Storage(e) => e.is_retryable(),
            _ => false,
        }
    }

    /// Create an API error from the envelope fields, applying the generic fallback.
    pub fn api(code: Option<String>, description: Option<String>) -> Self {
        Self::Api {
            code,
            description: description
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| GENERIC_API_ERROR.to_string()),
        }
    }

    /// Create an invalid data error.
    pub fn invalid_data(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidData {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for MpesaError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
