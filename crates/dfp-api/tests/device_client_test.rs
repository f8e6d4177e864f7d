#![allow(clippy::unwrap_used)]
// Integration tests for `Session` and `DeviceClient` using wiremock.

use std::time::Duration;

use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use dfp_api::{Credentials, DeviceClient, Error, Family, Module, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

const LONG_LEASE: Duration = Duration::from_secs(3600);

async fn setup(lease: Duration) -> (MockServer, DeviceClient) {
    let server = MockServer::start().await;
    let credentials = Credentials::new(
        &server.uri(),
        "admin",
        SecretString::from("s3cret".to_owned()),
    )
    .unwrap();
    let transport = TransportConfig::default()
        .with_timeout(Duration::from_secs(5))
        .with_token_lease(lease);
    let client = DeviceClient::new(credentials, &transport).unwrap();
    (server, client)
}

fn login_mock(token: &str) -> Mock {
    Mock::given(method("POST"))
        .and(path("/token-auth"))
        .and(body_json(json!({ "username": "admin", "password": "s3cret" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": token })))
}

fn attributes(body: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "data": { "attributes": body } }))
}

// ── Token lifecycle ─────────────────────────────────────────────────

#[tokio::test]
async fn test_acquire_token_stores_token() {
    let (server, client) = setup(LONG_LEASE).await;
    login_mock("abc").expect(1).mount(&server).await;

    assert!(!client.session().has_valid_token().await);
    client.session().acquire_token().await.unwrap();
    assert!(client.session().has_valid_token().await);
}

#[tokio::test]
async fn test_acquire_token_failure_is_authentication_error() {
    let (server, client) = setup(LONG_LEASE).await;

    Mock::given(method("POST"))
        .and(path("/token-auth"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad credentials"))
        .mount(&server)
        .await;

    let result = client.session().acquire_token().await;

    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
    assert!(!client.session().has_valid_token().await);
}

#[tokio::test]
async fn test_valid_token_is_not_renewed() {
    let (server, client) = setup(LONG_LEASE).await;
    login_mock("abc").expect(1).mount(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/dfps"))
        .and(header("authorization", "Bearer abc"))
        .respond_with(attributes(json!({ "temp": 42 })))
        .expect(2)
        .mount(&server)
        .await;

    client.fetch_module(Module::Dfp).await.unwrap();
    client.fetch_module(Module::Dfp).await.unwrap();
}

#[tokio::test]
async fn test_expired_token_renews_once_before_call() {
    let (server, client) = setup(Duration::ZERO).await;
    // One login from acquire_token, exactly one more from the call.
    login_mock("abc").expect(2).mount(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/tfps/io"))
        .and(header("authorization", "Bearer abc"))
        .respond_with(attributes(json!({ "pin": true })))
        .expect(1)
        .mount(&server)
        .await;

    client.session().acquire_token().await.unwrap();
    let attrs = client.fetch_module(Module::TfpIo).await.unwrap();
    assert_eq!(attrs["pin"], true);
}

#[tokio::test]
async fn test_failed_renewal_falls_back_to_previous_token() {
    let (server, client) = setup(Duration::ZERO).await;

    login_mock("first").up_to_n_times(1).mount(&server).await;
    Mock::given(method("POST"))
        .and(path("/token-auth"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/dfps"))
        .and(header("authorization", "Bearer first"))
        .respond_with(attributes(json!({ "temp": 21 })))
        .expect(1)
        .mount(&server)
        .await;

    client.session().acquire_token().await.unwrap();
    let attrs = client.fetch_module(Module::Dfp).await.unwrap();
    assert_eq!(attrs["temp"], 21);
}

#[tokio::test]
async fn test_no_token_request_is_rejected_downstream() {
    let (server, client) = setup(LONG_LEASE).await;

    Mock::given(method("POST"))
        .and(path("/token-auth"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/dfps"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result = client.fetch_module(Module::Dfp).await;
    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
}

// ── Module reads ────────────────────────────────────────────────────

#[tokio::test]
async fn test_fetch_module_sends_json_content_type() {
    let (server, client) = setup(LONG_LEASE).await;
    login_mock("abc").mount(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/dfps/io"))
        .and(header("content-type", "application/json"))
        .respond_with(attributes(json!({ "relay1": 1, "relay2": 0 })))
        .expect(1)
        .mount(&server)
        .await;

    let attrs = client.fetch_module(Module::DfpIo).await.unwrap();

    assert_eq!(attrs.len(), 2);
    assert_eq!(attrs["relay1"], 1);
}

#[tokio::test]
async fn test_fetch_module_http_error() {
    let (server, client) = setup(LONG_LEASE).await;
    login_mock("abc").mount(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/tfps"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let err = client.fetch_module(Module::Tfp).await.unwrap_err();

    assert!(matches!(err, Error::Status { status: 500, .. }), "got: {err:?}");
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_fetch_module_without_attributes_is_deserialization_error() {
    let (server, client) = setup(LONG_LEASE).await;
    login_mock("abc").mount(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/dfps"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": {} })))
        .mount(&server)
        .await;

    let err = client.fetch_module(Module::Dfp).await.unwrap_err();
    assert!(matches!(err, Error::Deserialization { .. }), "got: {err:?}");
}

#[tokio::test]
async fn test_fetch_tank() {
    let (server, client) = setup(LONG_LEASE).await;
    login_mock("abc").mount(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/tanks/main"))
        .and(header("authorization", "Bearer abc"))
        .respond_with(attributes(json!({ "level": 73.5 })))
        .expect(1)
        .mount(&server)
        .await;

    let attrs = client.fetch_tank("main").await.unwrap();
    assert_eq!(attrs["level"], 73.5);
}

// ── Actions ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_run_action_posts_to_family_endpoint() {
    let (server, client) = setup(LONG_LEASE).await;
    login_mock("abc").mount(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/tfps/action/start"))
        .and(header("authorization", "Bearer abc"))
        .respond_with(ResponseTemplate::new(200).set_body_string("started"))
        .expect(1)
        .mount(&server)
        .await;

    let body = client.run_action(Family::Tfp, "start").await.unwrap();
    assert_eq!(body, "started");
}

#[tokio::test]
async fn test_run_action_rejects_empty_name() {
    let (_server, client) = setup(LONG_LEASE).await;

    let err = client.run_action(Family::Dfp, "").await.unwrap_err();
    assert!(matches!(err, Error::MissingParameter { field: "action" }));
}
