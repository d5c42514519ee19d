//! Tests for the startup warm-up prober

use std::time::{Duration, Instant};

use idp_gateway::config::WarmupConfig;
use idp_gateway::warmup::{on_ready, Prober, SkipReason, WarmupSettings, WarmupState};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN_PATH: &str = "/auth/realms/master/protocol/openid-connect/token";
const WARMUP_PATH: &str = "/auth/admin/realms/europe/clients";

fn warmup_config(delay_ms: u64) -> WarmupConfig {
    WarmupConfig {
        client_id: "warmup-client".into(),
        client_secret: "warmup-secret".into(),
        token_path: TOKEN_PATH.into(),
        warmup_path: WARMUP_PATH.into(),
        delay_ms,
        method: "GET".into(),
    }
}

fn prober(server: &MockServer) -> Prober {
    let settings = WarmupSettings::from_config(&warmup_config(0)).unwrap();
    Prober::new(settings, server.uri())
}

#[tokio::test]
async fn test_blank_properties_skip_without_calls() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (state, handle) = on_ready(&WarmupConfig::default(), &server.uri());

    assert_eq!(state, WarmupState::Skipped(SkipReason::Missing("client_id")));
    assert!(handle.is_none());
}

#[tokio::test]
async fn test_sentinel_value_disables_warmup() {
    let mut cfg = warmup_config(0);
    cfg.client_secret = "REMOVED".into();

    let (state, handle) = on_ready(&cfg, "http://localhost:1");

    assert_eq!(state, WarmupState::Skipped(SkipReason::Disabled("client_secret")));
    assert!(handle.is_none());
}

#[tokio::test]
async fn test_token_rejection_fails_without_probe() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(path(WARMUP_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let state = prober(&server).run().await;

    assert_eq!(state, WarmupState::Failed);
}

#[tokio::test]
async fn test_successful_warmup_sends_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("grant_type=client_credentials"))
        .and(body_string_contains("client_id=warmup-client"))
        .and(body_string_contains("client_secret=warmup-secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "abc",
            "token_type": "Bearer",
            "expires_in": 60
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(WARMUP_PATH))
        .and(header("authorization", "Bearer abc"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let state = prober(&server).run().await;

    assert_eq!(state, WarmupState::Completed);
}

#[tokio::test]
async fn test_probe_rejection_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "abc"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(WARMUP_PATH))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;

    let state = prober(&server).run().await;

    assert_eq!(state, WarmupState::Failed);
}

#[tokio::test]
async fn test_token_response_without_access_token_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "error": "unauthorized_client"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(path(WARMUP_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let state = prober(&server).run().await;

    assert_eq!(state, WarmupState::Failed);
}

#[tokio::test]
async fn test_unreachable_server_fails_quietly() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let settings = WarmupSettings::from_config(&warmup_config(0)).unwrap();
    let state = Prober::new(settings, format!("http://{}", addr)).run().await;

    assert_eq!(state, WarmupState::Failed);
}

#[tokio::test]
async fn test_ready_hook_does_not_wait_for_probe() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "access_token": "abc" }))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(WARMUP_PATH))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let started = Instant::now();
    let (state, handle) = on_ready(&warmup_config(200), &server.uri());

    // the hook hands the probe off and returns straight away
    assert!(started.elapsed() < Duration::from_millis(200));
    assert_eq!(state, WarmupState::Running);

    let handle = handle.unwrap();
    assert!(!handle.is_finished());
    assert_eq!(handle.await.unwrap(), WarmupState::Completed);
    assert!(started.elapsed() >= Duration::from_millis(700));
}

#[tokio::test]
async fn test_configured_method_is_used() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "abc"
        })))
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .and(path(WARMUP_PATH))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let mut cfg = warmup_config(0);
    cfg.method = "head".into();
    let settings = WarmupSettings::from_config(&cfg).unwrap();

    let state = Prober::new(settings, format!("{}/", server.uri())).run().await;

    assert_eq!(state, WarmupState::Completed);
}

#[tokio::test]
async fn test_token_grant_reports_endpoint_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "access_token": "abc"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (token, status) = prober(&server).fetch_token().await.unwrap();

    assert_eq!(token.as_str(), "abc");
    assert_eq!(status, 201);
}
