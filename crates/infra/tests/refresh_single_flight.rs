//! End-to-end refresh behavior against a mock API
//!
//! Covers the single-flight refresh, fan-out of its outcome to every queued
//! operation, the one-resend bound and the single refresh call per cycle.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use assetdesk_common::testing::MockKeychainProvider;
use assetdesk_common::SecretStore;
use assetdesk_domain::{ApiConfig, ClientError};
use assetdesk_infra::{ApiClient, ApiRequest, MultipartPayload, TokenStore};
use futures::future::join_all;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer, store: Arc<TokenStore>) -> Arc<ApiClient> {
    let config = ApiConfig { base_url: server.uri(), ..Default::default() };
    Arc::new(ApiClient::builder().config(config).store(store).build().expect("client"))
}

fn logged_in_store() -> (Arc<TokenStore>, MockKeychainProvider) {
    let keychain = MockKeychainProvider::new("AssetDesk.integration");
    let store = TokenStore::open(Arc::new(keychain.clone()));
    store.set_tokens("A1", Some("R1".to_string()));
    (Arc::new(store), keychain)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn five_parallel_expired_requests_share_one_refresh() -> anyhow::Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/assets"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Token expired"})))
        .expect(5)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .and(body_json(json!({"refresh_token": "R1"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": "A2"}))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/assets"))
        .and(header("authorization", "Bearer A2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "a-1"}])))
        .expect(6)
        .mount(&server)
        .await;

    let (store, keychain) = logged_in_store();
    let client = client(&server, store.clone());

    let results = join_all((0..5).map(|_| {
        let client = client.clone();
        tokio::spawn(async move { client.execute_value(&ApiRequest::get("/assets")).await })
    }))
    .await;

    for result in results {
        assert_eq!(result??, json!([{"id": "a-1"}]));
    }

    // A later operation goes straight out with the renewed token.
    let sixth = client.execute_value(&ApiRequest::get("/assets")).await?;
    assert_eq!(sixth, json!([{"id": "a-1"}]));

    assert_eq!(store.access_token().as_deref(), Some("A2"));
    assert_eq!(keychain.get("access_token")?.as_deref(), Some("A2"));
    assert_eq!(keychain.get("refresh_token")?.as_deref(), Some("R1"));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn failed_refresh_fans_out_one_error_and_clears_session() -> anyhow::Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"detail": "Refresh token expired"}))
                .set_delay(Duration::from_millis(150)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (store, keychain) = logged_in_store();
    let expired = Arc::new(AtomicUsize::new(0));
    let listener = {
        let expired = expired.clone();
        move |_: &ClientError| {
            expired.fetch_add(1, Ordering::SeqCst);
        }
    };
    let config = ApiConfig { base_url: server.uri(), ..Default::default() };
    let client = Arc::new(
        ApiClient::builder()
            .config(config)
            .store(store.clone())
            .listener(Arc::new(listener))
            .build()?,
    );

    let paths = ["/assets", "/users", "/tickets", "/asset-requests"];
    let results = join_all(paths.iter().map(|p| {
        let client = client.clone();
        let request = ApiRequest::get(*p);
        tokio::spawn(async move { client.execute_value(&request).await })
    }))
    .await;

    let errors: Vec<ClientError> =
        results.into_iter().map(|r| r.expect("task").expect_err("refresh must fail")).collect();
    assert!(matches!(&errors[0], ClientError::RefreshFailed(msg) if msg.contains("Refresh token expired")));
    assert!(errors.iter().all(|e| e == &errors[0]));

    assert!(store.get().is_empty());
    assert!(keychain.is_empty());
    assert_eq!(expired.load(Ordering::SeqCst), 1);
    Ok(())
}

#[tokio::test]
async fn second_unauthorized_after_refresh_is_not_retried() -> anyhow::Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/financials/summary"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "A2"})))
        .expect(1)
        .mount(&server)
        .await;

    let (store, _keychain) = logged_in_store();
    let client = client(&server, store.clone());

    let err = client
        .execute_value(&ApiRequest::get("/financials/summary"))
        .await
        .expect_err("second 401 must surface");

    assert!(matches!(err, ClientError::Unauthenticated(_)));
    assert_eq!(store.access_token().as_deref(), Some("A2"));
    Ok(())
}

#[tokio::test]
async fn rotated_refresh_token_is_persisted() -> anyhow::Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": "A2", "refresh_token": "R2"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(header("authorization", "Bearer A2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"total": 3})))
        .mount(&server)
        .await;

    let (store, keychain) = logged_in_store();
    let client = client(&server, store);

    client.execute_value(&ApiRequest::get("/assets/stats")).await?;

    assert_eq!(keychain.get("refresh_token")?.as_deref(), Some("R2"));
    Ok(())
}

#[tokio::test]
async fn refresh_request_carries_no_bearer_token() -> anyhow::Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "A2"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(header("authorization", "Bearer A2"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let (store, _keychain) = logged_in_store();
    let client = client(&server, store);
    client.execute_value(&ApiRequest::get("/auth/me")).await?;

    let requests = server.received_requests().await.expect("recording enabled");
    let refresh = requests
        .iter()
        .find(|r| r.url.path() == "/auth/refresh")
        .expect("refresh request sent");
    assert!(refresh.headers.get("authorization").is_none());
    Ok(())
}

#[tokio::test]
async fn refresh_is_sent_once_even_with_transport_retries() -> anyhow::Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/assets"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(503).set_body_string("down"))
        .expect(1)
        .mount(&server)
        .await;

    let (store, _keychain) = logged_in_store();
    let config = ApiConfig { base_url: server.uri(), max_attempts: 3, ..Default::default() };
    let client = ApiClient::builder().config(config).store(store.clone()).build()?;

    let err = client
        .execute_value(&ApiRequest::get("/assets"))
        .await
        .expect_err("refresh must fail");

    assert_eq!(err, ClientError::RefreshFailed("API error (503): down".to_string()));
    assert!(store.get().is_empty());

    let requests = server.received_requests().await.expect("recording enabled");
    let refresh_calls = requests.iter().filter(|r| r.url.path() == "/auth/refresh").count();
    assert_eq!(refresh_calls, 1);
    Ok(())
}

#[tokio::test]
async fn multipart_upload_is_rebuilt_for_resend_after_refresh() -> anyhow::Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/upload"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "A2"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .and(header("authorization", "Bearer A2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"file_url": "/files/r.pdf"})))
        .expect(1)
        .mount(&server)
        .await;

    let (store, _keychain) = logged_in_store();
    let client = client(&server, store);

    let payload = MultipartPayload::new().text("asset_id", "a-1").file(
        "file",
        "receipt.pdf",
        b"%PDF-1.4 receipt".to_vec(),
        Some("application/pdf".to_string()),
    );
    let request =
        ApiRequest::post("/upload").header("Content-Type", "application/json").multipart(payload);
    let value = client.execute_value(&request).await?;
    assert_eq!(value["file_url"], "/files/r.pdf");

    let requests = server.received_requests().await.expect("recording enabled");
    let uploads: Vec<_> = requests.iter().filter(|r| r.url.path() == "/upload").collect();
    assert_eq!(uploads.len(), 2);
    for upload in uploads {
        let content_type =
            upload.headers.get("content-type").and_then(|v| v.to_str().ok()).unwrap_or_default();
        assert!(content_type.starts_with("multipart/form-data; boundary="));
        let body = String::from_utf8_lossy(&upload.body);
        assert!(body.contains("name=\"file\"; filename=\"receipt.pdf\""));
        assert!(body.contains("%PDF-1.4 receipt"));
    }
    Ok(())
}
