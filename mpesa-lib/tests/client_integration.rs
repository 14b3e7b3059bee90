//! Integration tests for the session key cache and the gateway client.
//!
//! Both the issuer function and the OpenAPI are replaced with `wiremock`
//! servers, so no network access is required:
//!
//! ```bash
//! cargo test -p mpesa-lib --test client_integration
//! ```

use mpesa_lib::gateway::{MpesaClient, MpesaConfig};
use mpesa_lib::secure_storage::{InMemoryKeyStorage, SecureKeyStorageExt};
use mpesa_lib::session::SESSION_KEY_STORAGE_KEY;
use mpesa_lib::{MpesaError, MpesaErrorCode};
use serde_json::json;
use std::time::Duration;
use wiremock::{
    matchers::{body_json, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

const ISSUER_PATH: &str = "/functions/v1/mpesa-checkout";
const C2B_PATH: &str = "/ipg/v2/vodacomTZN/c2bPayment/singleStage/";

fn config(server: &MockServer) -> MpesaConfig {
    MpesaConfig::new(format!("{}{}", server.uri(), ISSUER_PATH))
        .with_endpoint_base_url(format!("{}/ipg/v2/vodacomTZN", server.uri()))
        .with_timeout(5)
}

fn client(server: &MockServer) -> MpesaClient<InMemoryKeyStorage> {
    MpesaClient::new(config(server), InMemoryKeyStorage::new()).unwrap()
}

async fn client_with_cached_key(server: &MockServer, key: &str) -> MpesaClient<InMemoryKeyStorage> {
    let storage = InMemoryKeyStorage::new();
    storage
        .upsert(SESSION_KEY_STORAGE_KEY, key.as_bytes())
        .await
        .unwrap();
    MpesaClient::new(config(server), storage).unwrap()
}

async fn stored_key(client: &MpesaClient<InMemoryKeyStorage>) -> Option<String> {
    client
        .session()
        .storage()
        .retrieve_string(SESSION_KEY_STORAGE_KEY)
        .await
        .unwrap()
}

async fn mount_issuer(server: &MockServer, session_id: &str, times: u64) {
    Mock::given(method("GET"))
        .and(path(ISSUER_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "output_SessionID": session_id })),
        )
        .expect(times)
        .mount(server)
        .await;
}

fn success_body(reference: &str) -> serde_json::Value {
    json!({
        "output_ResponseCode": "INS-0",
        "output_ResponseDesc": "Request processed successfully",
        "output_TransactionID": "49XCDF6",
        "output_ConversationID": "38ab2b9c",
        "output_ThirdPartyConversationID": reference
    })
}

// ============================================================================
// Session key acquisition
// ============================================================================

#[tokio::test]
async fn test_acquire_uses_cached_key_without_network() {
    let server = MockServer::start().await;
    mount_issuer(&server, "unused", 0).await;

    let client = client_with_cached_key(&server, "cached-key").await;
    let key = client.acquire_session_key().await.unwrap();

    assert_eq!(key.as_str(), "cached-key");
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_acquire_fetches_once_and_stores() {
    let server = MockServer::start().await;
    mount_issuer(&server, "fresh-key", 1).await;

    let client = client(&server);
    let key = client.acquire_session_key().await.unwrap();
    assert_eq!(key.as_str(), "fresh-key");
    assert_eq!(stored_key(&client).await.as_deref(), Some("fresh-key"));

    // Second acquisition is served from storage.
    let again = client.acquire_session_key().await.unwrap();
    assert_eq!(again.as_str(), "fresh-key");

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].headers.get("content-type").unwrap(),
        "application/json"
    );
}

#[tokio::test]
async fn test_acquire_missing_session_id_leaves_storage_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ISSUER_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "error": "nope" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let err = client.acquire_session_key().await.unwrap_err();

    assert!(matches!(
        err,
        MpesaError::MissingField {
            field: "output_SessionID"
        }
    ));
    assert_eq!(err.to_string(), "output_SessionID not found in response");
    assert!(client.session().storage().is_empty());
}

#[tokio::test]
async fn test_acquire_empty_session_id_is_missing() {
    let server = MockServer::start().await;
    mount_issuer(&server, "", 1).await;

    let client = client(&server);
    let err = client.acquire_session_key().await.unwrap_err();

    assert_eq!(err.code(), MpesaErrorCode::MissingField);
    assert!(client.session().storage().is_empty());
}

#[tokio::test]
async fn test_acquire_issuer_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ISSUER_PATH))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = client(&server);
    let err = client.acquire_session_key().await.unwrap_err();

    match err {
        MpesaError::Http {
            status,
            ref status_text,
            ..
        } => {
            assert_eq!(status, 500);
            assert_eq!(status_text, "Internal Server Error");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(client.session().storage().is_empty());
}

#[tokio::test]
async fn test_acquire_unreachable_issuer_is_connection_failure() {
    // Nothing listens on port 1.
    let config = MpesaConfig::new("http://127.0.0.1:1/issue").with_timeout(5);
    let client = MpesaClient::new(config, InMemoryKeyStorage::new()).unwrap();

    let err = client.acquire_session_key().await.unwrap_err();

    assert_eq!(err.code(), MpesaErrorCode::ConnectionFailed);
    assert!(err.is_retryable());
    assert!(client.session().storage().is_empty());
}

#[tokio::test]
async fn test_acquire_slow_issuer_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ISSUER_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "output_SessionID": "late-key" }))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let client = MpesaClient::new(config(&server).with_timeout(1), InMemoryKeyStorage::new())
        .unwrap();
    let err = client.acquire_session_key().await.unwrap_err();

    match err {
        MpesaError::ConnectionTimeout { timeout_ms, .. } => assert_eq!(timeout_ms, 1000),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(client.session().storage().is_empty());
}

#[tokio::test]
async fn test_unusable_session_key_is_not_stored() {
    let server = MockServer::start().await;
    mount_issuer(&server, "bad\nkey", 2).await;

    let client = client(&server);
    let err = client.acquire_session_key().await.unwrap_err();
    assert_eq!(err.code(), MpesaErrorCode::InvalidData);
    assert!(client.session().storage().is_empty());

    // Nothing was cached, so the next request goes back to the issuer.
    let err = client.get("/queryTransactionStatus/").await.unwrap_err();
    assert_eq!(err.code(), MpesaErrorCode::InvalidData);
    assert!(client.session().storage().is_empty());
}

#[tokio::test]
async fn test_clear_is_idempotent() {
    let server = MockServer::start().await;

    let client = client(&server);
    client.clear_session_key().await.unwrap();

    let client = client_with_cached_key(&server, "cached-key").await;
    client.clear_session_key().await.unwrap();
    assert_eq!(stored_key(&client).await, None);
}

// ============================================================================
// Authenticated requests
// ============================================================================

#[tokio::test]
async fn test_request_acquires_key_once_and_sends_bearer() {
    let server = MockServer::start().await;
    mount_issuer(&server, "fresh-key", 1).await;

    Mock::given(method("POST"))
        .and(path(C2B_PATH))
        .and(header("Authorization", "Bearer fresh-key"))
        .and(header("Content-Type", "application/json"))
        .and(header("Origin", "*"))
        .respond_with(ResponseTemplate::new(200).set_body_json(success_body("ref-1")))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let envelope = client
        .post("/c2bPayment/singleStage/", &json!({ "input_Amount": 1 }))
        .await
        .unwrap();

    assert!(envelope.is_success());
    assert_eq!(envelope.transaction_id(), Some("49XCDF6"));
}

#[tokio::test]
async fn test_get_request_sends_no_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ipg/v2/vodacomTZN/queryTransactionStatus/"))
        .and(header("Authorization", "Bearer cached-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(success_body("r")))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_with_cached_key(&server, "cached-key").await;
    client.get("/queryTransactionStatus/").await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].body.is_empty());
}

#[tokio::test]
async fn test_response_code_mismatch_fails_with_description() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(C2B_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "output_ResponseCode": "INS-10",
            "output_ResponseDesc": "Duplicate Transaction"
        })))
        .mount(&server)
        .await;

    let client = client_with_cached_key(&server, "cached-key").await;
    let err = client
        .initiate_c2b_payment("712345678", 1000, "ref-1")
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Duplicate Transaction");
    assert_eq!(err.code(), MpesaErrorCode::Api);
}

#[tokio::test]
async fn test_response_code_mismatch_without_description_uses_fallback() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(C2B_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "output_ResponseCode": "INS-1" })),
        )
        .mount(&server)
        .await;

    let client = client_with_cached_key(&server, "cached-key").await;
    let err = client
        .initiate_c2b_payment("712345678", 1000, "ref-1")
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "M-Pesa API error");
}

#[tokio::test]
async fn test_non_success_status_is_transport_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(C2B_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({
            "output_ResponseCode": "INS-0"
        })))
        .mount(&server)
        .await;

    let client = client_with_cached_key(&server, "cached-key").await;
    let err = client
        .initiate_c2b_payment("712345678", 1000, "ref-1")
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "M-Pesa API request failed: Service Unavailable");
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_malformed_body_is_serialization_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(C2B_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let client = client_with_cached_key(&server, "cached-key").await;
    let err = client
        .initiate_c2b_payment("712345678", 1000, "ref-1")
        .await
        .unwrap_err();

    assert_eq!(err.code(), MpesaErrorCode::Serialization);
}

// ============================================================================
// C2B payments
// ============================================================================

#[tokio::test]
async fn test_initiate_c2b_payment_payload() {
    let server = MockServer::start().await;
    mount_issuer(&server, "fresh-key", 1).await;

    Mock::given(method("POST"))
        .and(path(C2B_PATH))
        .and(header("Authorization", "Bearer fresh-key"))
        .and(body_json(json!({
            "input_Amount": 1000,
            "input_Country": "TZN",
            "input_Currency": "TZS",
            "input_CustomerMSISDN": "255712345678",
            "input_ServiceProviderCode": "000000",
            "input_ThirdPartyConversationID": "ref-1",
            "input_TransactionReference": "ref-1",
            "input_PurchasedItemsDesc": "Cart Items"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(success_body("ref-1")))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let envelope = client
        .initiate_c2b_payment("712345678", 1000, "ref-1")
        .await
        .unwrap();

    assert_eq!(envelope.third_party_conversation_id(), Some("ref-1"));
}

#[tokio::test]
async fn test_invalid_payment_sends_nothing() {
    let server = MockServer::start().await;
    mount_issuer(&server, "fresh-key", 0).await;

    let client = client(&server);
    let err = client
        .initiate_c2b_payment("+255712345678", 1000, "ref-1")
        .await
        .unwrap_err();

    assert_eq!(err.code(), MpesaErrorCode::InvalidData);
    assert!(server.received_requests().await.unwrap().is_empty());
}

// ============================================================================
// Expired session keys
// ============================================================================

#[tokio::test]
async fn test_unauthorized_refreshes_key_and_retries_once() {
    let server = MockServer::start().await;
    mount_issuer(&server, "fresh-key", 1).await;

    Mock::given(method("POST"))
        .and(path(C2B_PATH))
        .and(header("Authorization", "Bearer stale-key"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(C2B_PATH))
        .and(header("Authorization", "Bearer fresh-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(success_body("ref-1")))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_with_cached_key(&server, "stale-key").await;
    let envelope = client
        .initiate_c2b_payment("712345678", 1000, "ref-1")
        .await
        .unwrap();

    assert!(envelope.is_success());
    assert_eq!(stored_key(&client).await.as_deref(), Some("fresh-key"));
}

#[tokio::test]
async fn test_unauthorized_twice_surfaces_session_expired() {
    let server = MockServer::start().await;
    mount_issuer(&server, "fresh-key", 1).await;

    Mock::given(method("POST"))
        .and(path(C2B_PATH))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_with_cached_key(&server, "stale-key").await;
    let err = client
        .initiate_c2b_payment("712345678", 1000, "ref-1")
        .await
        .unwrap_err();

    assert!(matches!(err, MpesaError::SessionExpired));
}

#[tokio::test]
async fn test_unauthorized_without_retry_fails_immediately() {
    let server = MockServer::start().await;
    mount_issuer(&server, "fresh-key", 0).await;

    Mock::given(method("POST"))
        .and(path(C2B_PATH))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let storage = InMemoryKeyStorage::new();
    storage
        .upsert(SESSION_KEY_STORAGE_KEY, b"stale-key")
        .await
        .unwrap();
    let client = MpesaClient::new(
        config(&server).with_retry_on_expired_session(false),
        storage,
    )
    .unwrap();

    let err = client
        .initiate_c2b_payment("712345678", 1000, "ref-1")
        .await
        .unwrap_err();

    match err {
        MpesaError::Http { status, .. } => assert_eq!(status, 401),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(stored_key(&client).await.as_deref(), Some("stale-key"));
}

#[tokio::test]
async fn test_domain_error_is_not_retried() {
    let server = MockServer::start().await;
    mount_issuer(&server, "fresh-key", 0).await;

    Mock::given(method("POST"))
        .and(path(C2B_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "output_ResponseCode": "INS-2",
            "output_ResponseDesc": "Invalid API Key"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_with_cached_key(&server, "cached-key").await;
    let err = client
        .initiate_c2b_payment("712345678", 1000, "ref-1")
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Invalid API Key");
}
