//! Tests for startup provisioning through the admin API

use idp_gateway::config::{AdminUserConfig, Config};
use idp_gateway::host::{provision, AdminOutcome, ThemeArea};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN_PATH: &str = "/auth/realms/master/protocol/openid-connect/token";
const USERS_PATH: &str = "/auth/admin/realms/master/users";
const REALM_PATH: &str = "/auth/admin/realms/master";

fn config(server: &MockServer) -> Config {
    let mut cfg = Config::default();
    cfg.server.upstream_url = server.uri();
    cfg.server.context_path = "/auth".into();
    cfg.warmup.client_id = "bootstrap".into();
    cfg.warmup.client_secret = "secret".into();
    cfg.warmup.token_path = TOKEN_PATH.into();
    cfg.warmup.warmup_path = "/auth/admin/realms/master/clients".into();
    cfg.admin_user = AdminUserConfig {
        username: "admin".into(),
        password: "changeme".into(),
    };
    cfg
}

async fn mount_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "admin-token"
        })))
        .mount(server)
        .await;
}

async fn mount_users(server: &MockServer, users: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(USERS_PATH))
        .and(query_param("max", "1"))
        .and(header("authorization", "Bearer admin-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(users))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_realm(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(REALM_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "realm": "master",
            "loginTheme": "europe",
            "emailTheme": ""
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_missing_admin_is_created_and_themes_resolved() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_users(&server, serde_json::json!([])).await;
    mount_realm(&server).await;

    let location = format!("{}{}/f3a1", server.uri(), USERS_PATH);
    Mock::given(method("POST"))
        .and(path(USERS_PATH))
        .and(body_json(serde_json::json!({ "username": "admin", "enabled": true })))
        .respond_with(ResponseTemplate::new(201).insert_header("Location", location.as_str()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(format!("{}/f3a1/reset-password", USERS_PATH)))
        .and(body_json(serde_json::json!({
            "type": "password",
            "value": "changeme",
            "temporary": false
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let result = provision(&config(&server)).await.unwrap();

    assert_eq!(result.admin, AdminOutcome::Created);
    assert_eq!(
        result.themes,
        vec![
            (ThemeArea::Welcome, "keycloak".to_string()),
            (ThemeArea::Login, "europe".to_string()),
            (ThemeArea::Account, "keycloak".to_string()),
            (ThemeArea::Email, "keycloak".to_string()),
            (ThemeArea::Admin, "keycloak".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_existing_admin_is_not_recreated() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_users(&server, serde_json::json!([{ "id": "1", "username": "root" }])).await;
    mount_realm(&server).await;
    Mock::given(method("POST"))
        .and(path(USERS_PATH))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let result = provision(&config(&server)).await.unwrap();

    assert_eq!(result.admin, AdminOutcome::AlreadyPresent);
}

#[tokio::test]
async fn test_failed_password_removes_created_user() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_users(&server, serde_json::json!([])).await;
    mount_realm(&server).await;

    let location = format!("{}{}/f3a1", server.uri(), USERS_PATH);
    Mock::given(method("POST"))
        .and(path(USERS_PATH))
        .respond_with(ResponseTemplate::new(201).insert_header("Location", location.as_str()))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(format!("{}/f3a1/reset-password", USERS_PATH)))
        .respond_with(ResponseTemplate::new(400))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(format!("{}/f3a1", USERS_PATH)))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let result = provision(&config(&server)).await.unwrap();

    assert_eq!(result.admin, AdminOutcome::Failed);
}

#[tokio::test]
async fn test_rejected_credentials_stop_provisioning() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(path(USERS_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    assert!(provision(&config(&server)).await.is_none());
}

#[tokio::test]
async fn test_unreadable_realm_leaves_themes_empty() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_users(&server, serde_json::json!([{ "id": "1" }])).await;
    Mock::given(method("GET"))
        .and(path(REALM_PATH))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let result = provision(&config(&server)).await.unwrap();

    assert_eq!(result.admin, AdminOutcome::AlreadyPresent);
    assert!(result.themes.is_empty());
}

#[tokio::test]
async fn test_disabled_credentials_skip_provisioning() {
    let server = MockServer::start().await;
    let mut cfg = config(&server);
    cfg.warmup.client_secret = "REMOVED".into();

    assert!(provision(&cfg).await.is_none());
    assert!(server.received_requests().await.unwrap().is_empty());
}
