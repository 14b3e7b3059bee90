//! Authenticated M-Pesa OpenAPI client.
//!
//! Every call goes through [`MpesaClient::request`]:
//!
//! 1. Ensure a session key is available, fetching one at most once.
//! 2. Send the call with `Authorization: Bearer <key>`.
//! 3. Fail on any non-2xx status.
//! 4. Fail when the body's `output_ResponseCode` is not `INS-0`, even on 200.
//!
//! When the gateway answers 401 and [`MpesaConfig::retry_on_expired_session`]
//! is set, the cached key is cleared, a fresh one acquired, and the call
//! retried exactly once.

use reqwest::{Method, StatusCode};
use serde::Serialize;

use super::config::{is_http_url, MpesaConfig};
use super::envelope::ResponseEnvelope;
use crate::secure_storage::SecureKeyStorage;
use crate::session::{SessionKey, SessionKeyCache};
use crate::transport::{self, log_failure};
use crate::{MpesaError, Result};

const OPERATION: &str = "M-Pesa API request";

/// M-Pesa OpenAPI client with a cached session key.
pub struct MpesaClient<S> {
    config: MpesaConfig,
    http: reqwest::Client,
    session: SessionKeyCache<S>,
}

enum Attempt {
    Done(ResponseEnvelope),
    Unauthorized,
}

impl<S: SecureKeyStorage> MpesaClient<S> {
    /// Create a client from a validated configuration and a storage backend.
    pub fn new(config: MpesaConfig, storage: S) -> Result<Self> {
        config.validate()?;
        let http = transport::build_http_client(config.timeout_secs)?;
        let session = SessionKeyCache::with_http_client(
            storage,
            http.clone(),
            config.token_issuer_url.clone(),
            config.timeout_secs,
        );
        Ok(Self {
            config,
            http,
            session,
        })
    }

    /// Get the configuration.
    pub fn config(&self) -> &MpesaConfig {
        &self.config
    }

    /// The session key cache backing this client.
    pub fn session(&self) -> &SessionKeyCache<S> {
        &self.session
    }

    /// Return the cached session key or fetch a new one.
    pub async fn acquire_session_key(&self) -> Result<SessionKey> {
        self.session.acquire().await
    }

    /// Drop the cached session key.
    pub async fn clear_session_key(&self) -> Result<()> {
        self.session.clear().await
    }

    /// Build the full URL for an endpoint.
    ///
    /// Absolute `http(s)` URLs are used unchanged.
    pub fn url(&self, endpoint: &str) -> String {
        if is_http_url(endpoint) {
            return endpoint.to_string();
        }
        let base = self.config.endpoint_base_url.trim_end_matches('/');
        if endpoint.starts_with('/') {
            format!("{base}{endpoint}")
        } else {
            format!("{base}/{endpoint}")
        }
    }

    /// Authenticated `GET`.
    pub async fn get(&self, endpoint: &str) -> Result<ResponseEnvelope> {
        self.request(Method::GET, endpoint, Option::<&()>::None)
            .await
    }

    /// Authenticated `POST` with a JSON body.
    pub async fn post<B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<ResponseEnvelope> {
        self.request(Method::POST, endpoint, Some(body)).await
    }

    /// Make an authenticated request and validate the response envelope.
    ///
    /// Failures are logged here and returned unchanged.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, body)))]
    pub async fn request<B: Serialize + ?Sized>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&B>,
    ) -> Result<ResponseEnvelope> {
        let result = self.request_with_refresh(method, endpoint, body).await;
        if let Err(e) = &result {
            log_failure("Error making M-Pesa request", e);
        }
        result
    }

    async fn request_with_refresh<B: Serialize + ?Sized>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&B>,
    ) -> Result<ResponseEnvelope> {
        let url = self.url(endpoint);
        let payload = body.map(serde_json::to_vec).transpose()?;

        let key = self.session.acquire().await?;
        match self.send(&method, &url, payload.as_deref(), &key).await? {
            Attempt::Done(envelope) => return Ok(envelope),
            Attempt::Unauthorized if !self.config.retry_on_expired_session => {
                return Err(transport::status_error(OPERATION, StatusCode::UNAUTHORIZED));
            }
            Attempt::Unauthorized => {}
        }

        #[cfg(feature = "tracing")]
        tracing::info!(key = %key.masked(), "Session key rejected, refreshing once");
        self.session.clear().await?;
        let key = self.session.acquire().await?;

        match self.send(&method, &url, payload.as_deref(), &key).await? {
            Attempt::Done(envelope) => Ok(envelope),
            Attempt::Unauthorized => Err(MpesaError::SessionExpired),
        }
    }

    async fn send(
        &self,
        method: &Method,
        url: &str,
        payload: Option<&[u8]>,
        key: &SessionKey,
    ) -> Result<Attempt> {
        #[cfg(feature = "tracing")]
        tracing::debug!(%url, body_len = payload.map_or(0, <[u8]>::len), "Gateway request");

        let mut request = self
            .http
            .request(method.clone(), url)
            .headers(transport::authenticated_headers(key)?);
        if let Some(bytes) = payload {
            request = request.body(bytes.to_vec());
        }

        let response = request
            .send()
            .await
            .map_err(|e| transport::map_reqwest_error(OPERATION, url, self.config.timeout_secs, e))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Ok(Attempt::Unauthorized);
        }
        if !status.is_success() {
            return Err(transport::status_error(OPERATION, status));
        }

        let envelope = response
            .json::<ResponseEnvelope>()
            .await
            .map_err(|e| transport::map_reqwest_error(OPERATION, url, self.config.timeout_secs, e))?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            code = ?envelope.response_code,
            conversation_id = ?envelope.conversation_id(),
            "Gateway response"
        );

        envelope.into_result().map(Attempt::Done)
    }
}
