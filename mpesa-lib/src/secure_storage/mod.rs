//! Secure storage abstraction for the cached session key.
//!
//! The client never talks to a platform keychain directly. Callers inject a
//! [`SecureKeyStorage`] implementation; this crate ships:
//! - In-memory storage (for testing and short-lived processes)
//!
//! Mobile hosts bridge their platform store (Keychain, Keystore,
//! expo-secure-store) behind the same trait.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mpesa_lib::secure_storage::{InMemoryKeyStorage, SecureKeyStorage, SecureKeyStorageExt};
//!
//! let storage = InMemoryKeyStorage::new();
//!
//! storage.upsert("mpesaSessionKey", b"session-key").await?;
//!
//! if let Some(key) = storage.retrieve_string("mpesaSessionKey").await? {
//!     // Use the key...
//! }
//!
//! storage.delete_if_exists("mpesaSessionKey").await?;
//! ```

mod memory;
mod traits;

pub use memory::InMemoryKeyStorage;
pub use traits::{
    SecureKeyStorage, SecureKeyStorageExt, SecureStorageError, SecureStorageErrorCode,
    SecureStorageResult, StoreOptions,
};
