//! Core traits for secure storage.

use std::fmt;
use std::future::Future;

/// Error codes for secure storage operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum SecureStorageErrorCode {
    /// Key not found
    NotFound = 1000,
    /// Access denied (auth required)
    AccessDenied = 2000,
    /// Storage is locked
    StorageLocked = 2003,
    /// Key already exists
    AlreadyExists = 3000,
    /// Stored value is not in the expected format
    InvalidValue = 4000,
    /// Backing medium could not be read or written
    Io = 5000,
    /// Internal error
    Internal = 9999,
}

/// Error type for secure storage operations.
#[derive(Debug)]
pub struct SecureStorageError {
    /// Error code for FFI/mobile integration
    pub code: SecureStorageErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Key identifier related to error (if applicable)
    pub key_id: Option<String>,
}

impl SecureStorageError {
    /// Create a new error.
    pub fn new(code: SecureStorageErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            key_id: None,
        }
    }

    /// Create a new error with associated key ID.
    pub fn with_key(
        code: SecureStorageErrorCode,
        message: impl Into<String>,
        key_id: impl Into<String>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            key_id: Some(key_id.into()),
        }
    }

    /// Create a "not found" error.
    pub fn not_found(key_id: impl Into<String>) -> Self {
        let key_id = key_id.into();
        Self {
            code: SecureStorageErrorCode::NotFound,
            message: format!("Key not found: {}", key_id),
            key_id: Some(key_id),
        }
    }

    /// Create an "already exists" error.
    pub fn already_exists(key_id: impl Into<String>) -> Self {
        let key_id = key_id.into();
        Self {
            code: SecureStorageErrorCode::AlreadyExists,
            message: format!("Key already exists: {}", key_id),
            key_id: Some(key_id),
        }
    }

    /// Create an "access denied" error.
    pub fn access_denied(reason: impl Into<String>) -> Self {
        Self::new(SecureStorageErrorCode::AccessDenied, reason)
    }

    /// Check if this error indicates the key wasn't found.
    pub fn is_not_found(&self) -> bool {
        self.code == SecureStorageErrorCode::NotFound
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.code,
            SecureStorageErrorCode::StorageLocked | SecureStorageErrorCode::Io
        )
    }
}

impl fmt::Display for SecureStorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(key_id) = &self.key_id {
            write!(f, "{} (key: {})", self.message, key_id)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for SecureStorageError {}

/// Result type for secure storage operations.
pub type SecureStorageResult<T> = Result<T, SecureStorageError>;

/// Options for storing a value.
#[derive(Debug, Clone, Default)]
pub struct StoreOptions {
    /// Overwrite if key already exists
    pub overwrite: bool,
}

impl StoreOptions {
    /// Create default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow overwriting existing keys.
    pub fn overwrite(mut self) -> Self {
        self.overwrite = true;
        self
    }
}

/// Platform-agnostic secure storage trait.
///
/// Implementations should:
/// - Encrypt values at rest where the platform allows it
/// - Never log or expose stored values
pub trait SecureKeyStorage: Send + Sync {
    /// Store a value under the given identifier.
    ///
    /// # Errors
    /// - `AlreadyExists` if key exists and overwrite is false
    fn store(
        &self,
        key_id: &str,
        value: &[u8],
        options: StoreOptions,
    ) -> impl Future<Output = SecureStorageResult<()>> + Send;

    /// Retrieve a value by its identifier, or `None` if absent.
    fn retrieve(
        &self,
        key_id: &str,
    ) -> impl Future<Output = SecureStorageResult<Option<Vec<u8>>>> + Send;

    /// Delete a value by its identifier.
    ///
    /// # Errors
    /// - `NotFound` if key doesn't exist
    fn delete(&self, key_id: &str) -> impl Future<Output = SecureStorageResult<()>> + Send;

    /// Check if a key exists.
    fn exists(&self, key_id: &str) -> impl Future<Output = SecureStorageResult<bool>> + Send;
}

/// Extension trait for convenience methods.
pub trait SecureKeyStorageExt: SecureKeyStorage {
    /// Store or update a value (overwrite if exists).
    fn upsert(
        &self,
        key_id: &str,
        value: &[u8],
    ) -> impl Future<Output = SecureStorageResult<()>> + Send {
        self.store(key_id, value, StoreOptions::new().overwrite())
    }

    /// Retrieve a value and decode it as UTF-8.
    fn retrieve_string(
        &self,
        key_id: &str,
    ) -> impl Future<Output = SecureStorageResult<Option<String>>> + Send {
        async move {
            match self.retrieve(key_id).await? {
                Some(bytes) => String::from_utf8(bytes).map(Some).map_err(|_| {
                    SecureStorageError::with_key(
                        SecureStorageErrorCode::InvalidValue,
                        "stored value is not valid UTF-8",
                        key_id,
                    )
                }),
                None => Ok(None),
            }
        }
    }

    /// Delete a key if it exists (no error if missing).
    fn delete_if_exists(
        &self,
        key_id: &str,
    ) -> impl Future<Output = SecureStorageResult<()>> + Send {
        async move {
            match self.delete(key_id).await {
                Ok(()) => Ok(()),
                Err(e) if e.is_not_found() => Ok(()),
                Err(e) => Err(e),
            }
        }
    }
}

// Blanket implementation
impl<T: SecureKeyStorage> SecureKeyStorageExt for T {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = SecureStorageError::not_found("my-key");
        assert!(err.is_not_found());
        assert!(!err.is_retryable());
        assert_eq!(err.key_id, Some("my-key".to_string()));
        assert_eq!(err.to_string(), "Key not found: my-key (key: my-key)");
    }

    #[test]
    fn test_store_options() {
        assert!(!StoreOptions::new().overwrite);
        assert!(StoreOptions::new().overwrite().overwrite);
    }
}
