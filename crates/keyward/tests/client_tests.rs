use std::time::Duration;

use keyward::{Client, ClientConfig, ClientError};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> Client {
    Client::new(ClientConfig {
        base_url: server.uri(),
        timeout: Duration::from_secs(5),
    })
    .unwrap()
}

#[tokio::test]
async fn create_without_expiry_sends_empty_object() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/create"))
        .and(body_json(json!({})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "license_key": "0123456789ABCDEF0123456789ABCDEF",
            "expiresAt": null
        })))
        .expect(1)
        .mount(&server)
        .await;

    let created = client_for(&server).create(None).await.unwrap();
    assert_eq!(created.license_key, "0123456789ABCDEF0123456789ABCDEF");
    assert_eq!(created.expires_at, None);
}

#[tokio::test]
async fn create_with_expiry_sends_days() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/create"))
        .and(body_json(json!({"expires_in_days": 30})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "license_key": "AB",
            "expiresAt": "2026-11-18T12:00:00Z"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let created = client_for(&server).create(Some(30)).await.unwrap();
    assert_eq!(created.expires_at.as_deref(), Some("2026-11-18T12:00:00Z"));
}

#[tokio::test]
async fn create_failure_surfaces_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/create"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"error": "expires_in_days must be a positive integer"})),
        )
        .mount(&server)
        .await;

    let err = client_for(&server).create(Some(0)).await.unwrap_err();
    match err {
        ClientError::Api { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "expires_in_days must be a positive integer");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn check_valid_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/check/ABC"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "valid": true,
            "message": "License key valid",
            "expiresAt": "2026-10-20T12:00:00Z"
        })))
        .mount(&server)
        .await;

    let outcome = client_for(&server).check(" ABC ").await.unwrap();
    assert!(outcome.valid);
    assert_eq!(outcome.message, "License key valid");
    assert_eq!(outcome.expires_at.as_deref(), Some("2026-10-20T12:00:00Z"));
}

#[tokio::test]
async fn check_non_2xx_uses_message_field() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/check/GONE"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "valid": false,
            "message": "License key not found"
        })))
        .mount(&server)
        .await;

    let err = client_for(&server).check("GONE").await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::Api { status: 404, ref message } if message == "License key not found"
    ));
}

#[tokio::test]
async fn delete_returns_confirmation() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/delete/ABC"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "License key deleted"
        })))
        .mount(&server)
        .await;

    let message = client_for(&server).delete("ABC").await.unwrap();
    assert_eq!(message, "License key deleted");
}

#[tokio::test]
async fn non_json_failure_falls_back_to_generic_message() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/delete/ABC"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let err = client_for(&server).delete("ABC").await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::Api { status: 502, ref message } if message == "Error deleting license."
    ));
}

#[tokio::test]
async fn blank_key_never_reaches_the_server() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = client_for(&server).check("   ").await.unwrap_err();
    assert!(matches!(err, ClientError::InvalidInput(_)));
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    let client = Client::new(ClientConfig {
        base_url: "http://127.0.0.1:9".into(),
        timeout: Duration::from_secs(2),
    })
    .unwrap();
    let err = client.create(None).await.unwrap_err();
    assert!(matches!(err, ClientError::Http(_)));
}
