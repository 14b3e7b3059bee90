//! In-memory secure storage implementation.
//!
//! Values live only as long as the process. Suitable for tests and for hosts
//! that are happy to refetch the session key on every start.
//!
//! # Thread Safety
//!
//! This storage uses `RwLock` for thread-safe access. Lock poisoning
//! is handled gracefully by returning an error rather than panicking.

use std::collections::HashMap;
use std::sync::RwLock;

use super::traits::{
    SecureKeyStorage, SecureStorageError, SecureStorageErrorCode, SecureStorageResult,
    StoreOptions,
};

/// In-memory implementation of secure storage.
///
/// **Warning**: values are not encrypted.
pub struct InMemoryKeyStorage {
    values: RwLock<HashMap<String, Vec<u8>>>,
}

fn lock_error(context: &str) -> SecureStorageError {
    SecureStorageError::new(
        SecureStorageErrorCode::Internal,
        format!("InMemoryKeyStorage: lock poisoned during {}", context),
    )
}

impl InMemoryKeyStorage {
    /// Create a new, empty in-memory storage.
    pub fn new() -> Self {
        Self {
            values: RwLock::new(HashMap::new()),
        }
    }

    /// Get the number of stored values.
    ///
    /// Returns 0 if the lock is poisoned.
    pub fn len(&self) -> usize {
        self.values.read().map(|v| v.len()).unwrap_or(0)
    }

    /// Check if storage is empty.
    ///
    /// Returns true if the lock is poisoned.
    pub fn is_empty(&self) -> bool {
        self.values.read().map(|v| v.is_empty()).unwrap_or(true)
    }
}

impl Default for InMemoryKeyStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl SecureKeyStorage for InMemoryKeyStorage {
    async fn store(
        &self,
        key_id: &str,
        value: &[u8],
        options: StoreOptions,
    ) -> SecureStorageResult<()> {
        let mut values = self.values.write().map_err(|_| lock_error("store"))?;

        if values.contains_key(key_id) && !options.overwrite {
            return Err(SecureStorageError::already_exists(key_id));
        }

        values.insert(key_id.to_string(), value.to_vec());
        Ok(())
    }

    async fn retrieve(&self, key_id: &str) -> SecureStorageResult<Option<Vec<u8>>> {
        let values = self.values.read().map_err(|_| lock_error("retrieve"))?;
        Ok(values.get(key_id).cloned())
    }

    async fn delete(&self, key_id: &str) -> SecureStorageResult<()> {
        let mut values = self.values.write().map_err(|_| lock_error("delete"))?;

        if values.remove(key_id).is_some() {
            Ok(())
        } else {
            Err(SecureStorageError::not_found(key_id))
        }
    }

    async fn exists(&self, key_id: &str) -> SecureStorageResult<bool> {
        let values = self.values.read().map_err(|_| lock_error("exists"))?;
        Ok(values.contains_key(key_id))
    }
}
