//! Test utilities for M-Pesa client consumers.
//!
//! - [`FailingKeyStorage`]: storage that rejects every operation

use crate::secure_storage::{
    SecureKeyStorage, SecureStorageError, SecureStorageErrorCode, SecureStorageResult,
    StoreOptions,
};

/// Storage whose every operation fails with `code`.
pub struct FailingKeyStorage {
    code: SecureStorageErrorCode,
}

impl FailingKeyStorage {
    /// Fail with `code` on every call.
    pub fn new(code: SecureStorageErrorCode) -> Self {
        Self { code }
    }

    /// Storage that behaves like a locked device keychain.
    pub fn locked() -> Self {
        Self::new(SecureStorageErrorCode::StorageLocked)
    }

    fn error(&self, key_id: &str) -> SecureStorageError {
        SecureStorageError::with_key(self.code, "storage unavailable", key_id)
    }
}

impl SecureKeyStorage for FailingKeyStorage {
    async fn store(&self, key_id: &str, _: &[u8], _: StoreOptions) -> SecureStorageResult<()> {
        Err(self.error(key_id))
    }

    async fn retrieve(&self, key_id: &str) -> SecureStorageResult<Option<Vec<u8>>> {
        Err(self.error(key_id))
    }

    async fn delete(&self, key_id: &str) -> SecureStorageResult<()> {
        Err(self.error(key_id))
    }

    async fn exists(&self, key_id: &str) -> SecureStorageResult<bool> {
        Err(self.error(key_id))
    }
}
