//! Endpoint-level tests for the auth state machine: login, session details,
//! logout, and the cookie lifecycle between them.

mod common;

use axum::http::{header, StatusCode};
use serde_json::{json, Value};

use graphwire::auth::verify_token;
use graphwire::hooks::{
    AccountContext, AuthCollaborator, HookError, HookRegistry, HookResult, SessionDetailsContext,
};

use common::{cookie_token, server, server_with, test_config, widget_module};

fn set_cookie_of(response: &axum_test::TestResponse) -> String {
    response
        .headers()
        .get(header::SET_COOKIE)
        .expect("Set-Cookie issued")
        .to_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn test_anonymous_login_issues_matching_token_and_cookie() {
    let (server, state, _handle) = server().await;

    let response = server.post("/api/auth/login").json(&json!({})).await;
    assert_eq!(response.status_code(), StatusCode::CREATED);

    let body: Value = response.json();
    assert_eq!(body["peer"], "unknown");

    let token = body["token"].as_str().unwrap();
    let claims = verify_token(&state.config.token_secret, token).unwrap();
    assert_eq!(claims.account_id, "anonymous");
    assert_eq!(claims.peer_id, "unknown");

    let set_cookie = set_cookie_of(&response);
    assert_eq!(cookie_token(&set_cookie).as_deref(), Some(token));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("Path=/api"));
}

#[tokio::test]
async fn test_login_carries_peer_hint_through_recognition() {
    let (server, _state, _handle) = server().await;

    let response = server
        .post("/api/auth/login")
        .json(&json!({"peer_id": "device-7"}))
        .await;
    let body: Value = response.json();
    assert_eq!(body["peer"], "device-7");
}

#[tokio::test]
async fn test_session_reports_token_triplet() {
    let (server, state, _handle) = server().await;

    let login: Value = server.post("/api/auth/login").json(&json!({})).await.json();
    let token = login["token"].as_str().unwrap();
    let claims = verify_token(&state.config.token_secret, token).unwrap();

    let response = server
        .get("/api/auth/session")
        .add_header(header::COOKIE, format!("token={token}"))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let body: Value = response.json();
    assert_eq!(body["peer_id"], claims.peer_id);
    assert_eq!(body["account_id"], "anonymous");
    assert_eq!(body["session_id"], claims.session_id);
}

#[tokio::test]
async fn test_session_without_token_is_all_null() {
    let (server, _state, _handle) = server().await;

    let body: Value = server.get("/api/auth/session").await.json();
    assert_eq!(body["peer_id"], Value::Null);
    assert_eq!(body["account_id"], Value::Null);
    assert_eq!(body["session_id"], Value::Null);
}

#[tokio::test]
async fn test_logout_clears_cookie_and_is_idempotent() {
    let (server, _state, _handle) = server().await;

    let login: Value = server.post("/api/auth/login").json(&json!({})).await.json();
    let token = login["token"].as_str().unwrap().to_string();

    let response = server
        .get("/api/auth/logout")
        .add_header(header::COOKIE, format!("token={token}"))
        .await;
    assert_eq!(response.status_code(), StatusCode::NO_CONTENT);
    let set_cookie = set_cookie_of(&response);
    assert!(set_cookie.starts_with("token=;"));
    assert!(set_cookie.contains("Max-Age=0"));

    // The session is gone; a second logout with the same token still succeeds
    let again = server
        .get("/api/auth/logout")
        .add_header(header::COOKIE, format!("token={token}"))
        .await;
    assert_eq!(again.status_code(), StatusCode::NO_CONTENT);

    // And without any token at all
    let bare = server.get("/api/auth/logout").await;
    assert_eq!(bare.status_code(), StatusCode::NO_CONTENT);
}

struct CredentialBackend;

#[async_trait::async_trait]
impl AuthCollaborator for CredentialBackend {
    async fn authenticate_account(&self, ctx: &mut AccountContext) -> HookResult {
        match (ctx.username.as_deref(), ctx.password.as_deref()) {
            (Some("admin"), Some("secret")) => {
                ctx.account_id = Some("acct-admin".to_string());
                Ok(())
            }
            (Some(_), _) => Err(HookError::new("unknown username")),
            _ => Ok(()),
        }
    }
}

#[tokio::test]
async fn test_backend_credentials_resolve_account() {
    let hooks = HookRegistry::new().with_auth(std::sync::Arc::new(CredentialBackend));
    let (server, state, _handle) =
        server_with(test_config(), hooks, vec![widget_module()]).await;

    let response = server
        .post("/api/auth/login")
        .json(&json!({"username": "admin", "password": "secret"}))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);

    let body: Value = response.json();
    let claims = verify_token(&state.config.token_secret, body["token"].as_str().unwrap()).unwrap();
    assert_eq!(claims.account_id, "acct-admin");
}

#[tokio::test]
async fn test_denied_credentials_return_explicit_reason() {
    let hooks = HookRegistry::new().with_auth(std::sync::Arc::new(CredentialBackend));
    let (server, _state, _handle) =
        server_with(test_config(), hooks, vec![widget_module()]).await;

    let response = server
        .post("/api/auth/login")
        .json(&json!({"username": "nobody", "password": "x"}))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    assert!(response.text().contains("failed to authenticate username/password"));
}

struct ExpiringBackend;

#[async_trait::async_trait]
impl AuthCollaborator for ExpiringBackend {
    async fn session_details(&self, ctx: &mut SessionDetailsContext) -> HookResult {
        // Lazy expiry: the collaborator nulls the session it no longer knows
        ctx.session_id = None;
        Ok(())
    }
}

#[tokio::test]
async fn test_session_details_collaborator_can_null_fields() {
    let hooks = HookRegistry::new().with_auth(std::sync::Arc::new(ExpiringBackend));
    let (server, _state, _handle) =
        server_with(test_config(), hooks, vec![widget_module()]).await;

    let login: Value = server.post("/api/auth/login").json(&json!({})).await.json();
    let token = login["token"].as_str().unwrap();

    let body: Value = server
        .get("/api/auth/session")
        .add_header(header::COOKIE, format!("token={token}"))
        .await
        .json();
    assert_eq!(body["peer_id"], "unknown");
    assert_eq!(body["session_id"], Value::Null);
}

#[tokio::test]
async fn test_garbage_token_counts_as_absent() {
    let (server, _state, _handle) = server().await;

    let body: Value = server
        .get("/api/auth/session")
        .add_header(header::COOKIE, "token=not.a.token")
        .await
        .json();
    assert_eq!(body["session_id"], Value::Null);
}
