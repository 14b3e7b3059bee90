//! Session key acquisition and caching.
//!
//! The M-Pesa OpenAPI authorizes calls with a short-lived session key. A
//! serverless function holds the API credentials and hands out keys on `GET`;
//! this module caches the issued key in [`SecureKeyStorage`] under
//! [`SESSION_KEY_STORAGE_KEY`] and only goes back to the issuer when nothing
//! is cached.
//!
//! There is no expiry tracking: an absent (or empty) stored value is the only
//! signal to refetch. Acquisition is a plain check-then-act, so two concurrent
//! callers with an empty cache may both fetch; the last write wins and either
//! key is valid.

use std::fmt;

use serde::Deserialize;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::secure_storage::{SecureKeyStorage, SecureKeyStorageExt};
use crate::transport::{self, log_failure};
use crate::{MpesaError, Result};

/// Storage key holding the cached session key.
pub const SESSION_KEY_STORAGE_KEY: &str = "mpesaSessionKey";

/// Response field carrying the issued session key.
pub const SESSION_ID_FIELD: &str = "output_SessionID";

/// Opaque bearer credential for the M-Pesa OpenAPI.
///
/// Zeroized on drop and never printed in full.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SessionKey(String);

impl SessionKey {
    /// Wrap a raw key.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw key.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `Authorization` header value.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }

    /// Key with all but the last four characters hidden.
    pub fn masked(&self) -> String {
        let visible: String = self
            .0
            .chars()
            .rev()
            .take(4)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        if self.0.chars().count() <= 4 {
            "****".to_string()
        } else {
            format!("****{visible}")
        }
    }
}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SessionKey").field(&self.masked()).finish()
    }
}

#[derive(Deserialize)]
struct IssuerResponse {
    #[serde(rename = "output_SessionID", default)]
    session_id: Option<String>,
}

/// Caches the session key in secure storage and fetches it when absent.
pub struct SessionKeyCache<S> {
    storage: S,
    http: reqwest::Client,
    issuer_url: String,
    timeout_secs: u64,
}

impl<S: SecureKeyStorage> SessionKeyCache<S> {
    /// Create a cache that fetches from `issuer_url` with a fresh HTTP client.
    pub fn new(storage: S, issuer_url: impl Into<String>, timeout_secs: u64) -> Result<Self> {
        let http = transport::build_http_client(timeout_secs)?;
        Ok(Self::with_http_client(storage, http, issuer_url, timeout_secs))
    }

    /// Create a cache sharing an existing HTTP client.
    pub fn with_http_client(
        storage: S,
        http: reqwest::Client,
        issuer_url: impl Into<String>,
        timeout_secs: u64,
    ) -> Self {
        Self {
            storage,
            http,
            issuer_url: issuer_url.into(),
            timeout_secs,
        }
    }

    /// The underlying storage.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// The issuer URL.
    pub fn issuer_url(&self) -> &str {
        &self.issuer_url
    }

    /// Return the cached key without touching the network.
    ///
    /// An empty stored value counts as absent.
    pub async fn cached(&self) -> Result<Option<SessionKey>> {
        let stored = self
            .storage
            .retrieve_string(SESSION_KEY_STORAGE_KEY)
            .await?;
        Ok(stored.filter(|v| !v.is_empty()).map(SessionKey))
    }

    /// Return the cached key, fetching and storing a new one if none is cached.
    ///
    /// A cached key is returned as-is; no expiry validation is performed.
    /// Failures are logged here and returned unchanged.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), fields(issuer = %self.issuer_url)))]
    pub async fn acquire(&self) -> Result<SessionKey> {
        let result = self.cached_or_fetch().await;
        if let Err(e) = &result {
            log_failure("Error fetching session key", e);
        }
        result
    }

    /// Delete the cached key. Succeeds when nothing is cached.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self)))]
    pub async fn clear(&self) -> Result<()> {
        let result = self
            .storage
            .delete_if_exists(SESSION_KEY_STORAGE_KEY)
            .await
            .map_err(MpesaError::from);

        if let Err(e) = &result {
            log_failure("Error clearing session key", e);
        }
        result
    }

    async fn cached_or_fetch(&self) -> Result<SessionKey> {
        if let Some(key) = self.cached().await? {
            #[cfg(feature = "tracing")]
            tracing::trace!("Using cached session key");
            return Ok(key);
        }
        self.fetch_and_store().await
    }

    async fn fetch_and_store(&self) -> Result<SessionKey> {
        let key = self.fetch().await?;
        // A key that cannot be sent would never be replaced by the 401 refresh.
        transport::authenticated_headers(&key)?;
        self.storage
            .upsert(SESSION_KEY_STORAGE_KEY, key.as_str().as_bytes())
            .await?;

        #[cfg(feature = "tracing")]
        tracing::debug!(key = %key.masked(), "Stored new session key");
        Ok(key)
    }

    async fn fetch(&self) -> Result<SessionKey> {
        const OPERATION: &str = "session key request";

        #[cfg(feature = "tracing")]
        tracing::debug!(url = %self.issuer_url, "Requesting new session key");

        let response = self
            .http
            .get(&self.issuer_url)
            .headers(transport::issuer_headers())
            .send()
            .await
            .map_err(|e| {
                transport::map_reqwest_error(OPERATION, &self.issuer_url, self.timeout_secs, e)
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(transport::status_error(OPERATION, status));
        }

        let body = response.json::<serde_json::Value>().await.map_err(|e| {
            transport::map_reqwest_error(OPERATION, &self.issuer_url, self.timeout_secs, e)
        })?;
        let parsed: IssuerResponse = serde_json::from_value(body)?;

        parsed
            .session_id
            .filter(|id| !id.is_empty())
            .map(SessionKey)
            .ok_or(MpesaError::MissingField {
                field: SESSION_ID_FIELD,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secure_storage::InMemoryKeyStorage;

    fn cache(storage: InMemoryKeyStorage) -> SessionKeyCache<InMemoryKeyStorage> {
        // Port 9 (discard) is never contacted in these tests.
        SessionKeyCache::new(storage, "http://127.0.0.1:9/issue", 1).unwrap()
    }

    #[test]
    fn test_masked() {
        assert_eq!(SessionKey::new("abcdefgh").masked(), "****efgh");
        assert_eq!(SessionKey::new("abc").masked(), "****");
        assert_eq!(
            format!("{:?}", SessionKey::new("secret-value")),
            "SessionKey(\"****alue\")"
        );
    }

    #[test]
    fn test_bearer() {
        assert_eq!(SessionKey::new("k1").bearer(), "Bearer k1");
    }

    #[tokio::test]
    async fn test_cached_returns_stored_key() {
        let storage = InMemoryKeyStorage::new();
        storage
            .upsert(SESSION_KEY_STORAGE_KEY, b"stored-key")
            .await
            .unwrap();

        let cache = cache(storage);
        let key = cache.acquire().await.unwrap();
        assert_eq!(key.as_str(), "stored-key");
    }

    #[tokio::test]
    async fn test_empty_stored_value_is_absent() {
        let storage = InMemoryKeyStorage::new();
        storage.upsert(SESSION_KEY_STORAGE_KEY, b"").await.unwrap();

        let cache = cache(storage);
        assert_eq!(cache.cached().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_clear_is_idempotent() {
        let cache = cache(InMemoryKeyStorage::new());
        cache.clear().await.unwrap();

        cache
            .storage()
            .upsert(SESSION_KEY_STORAGE_KEY, b"k")
            .await
            .unwrap();
        cache.clear().await.unwrap();
        assert!(cache.storage().is_empty());
        cache.clear().await.unwrap();
    }
}
