//! Shared fixtures for the endpoint-level tests

#![allow(dead_code)]

use std::time::Duration;

use axum_test::TestServer;
use serde_json::json;

use graphwire::hooks::HookRegistry;
use graphwire::schema::{resolver, Contribution, SchemaModule};
use graphwire::server::init::{create_app, ServerHandle};
use graphwire::server::state::AppState;
use graphwire::subscribe::record::ChangeRecord;
use graphwire::ServerConfig;

/// Configuration with short debounce windows so tests settle quickly
pub fn test_config() -> ServerConfig {
    ServerConfig {
        notify_delay: Duration::from_millis(30),
        client_delta_delay: Duration::from_millis(30),
        ..ServerConfig::default()
    }
}

/// A demo feature module exercising reads, updates and failures
///
/// - `widget` reads Widget#42 and returns it
/// - `setWidget` updates Widget#42
/// - `breakWidget` records an update, then fails
pub fn widget_module() -> SchemaModule {
    SchemaModule::new("widgets")
        .contribute(
            "root",
            "Widget",
            Contribution::SchemaOnly("type Widget {\n  id: UUID!\n  name: String\n}".to_string()),
        )
        .contribute(
            "Root",
            "widget",
            Contribution::Full(
                "widget: Widget".to_string(),
                resolver(|ctx, _args| async move {
                    if let Some(scope) = &ctx.scope {
                        scope.record(ChangeRecord::read_one("Widget", "42"));
                    }
                    Ok(json!({"id": "42", "name": "sprocket"}))
                }),
            ),
        )
        .contribute(
            "Root",
            "setWidget",
            Contribution::Full(
                "setWidget(name: String): Widget".to_string(),
                resolver(|ctx, args| async move {
                    if let Some(scope) = &ctx.scope {
                        scope.record(ChangeRecord::update_one("Widget", "42"));
                    }
                    Ok(json!({"id": "42", "name": args["name"]}))
                }),
            ),
        )
        .contribute(
            "Root",
            "breakWidget",
            Contribution::Full(
                "breakWidget: Void".to_string(),
                resolver(|ctx, _args| async move {
                    if let Some(scope) = &ctx.scope {
                        scope.record(ChangeRecord::update_one("Widget", "42"));
                    }
                    Err(graphwire::ServerError::execution(vec![
                        "widget broke".to_string()
                    ]))
                }),
            ),
        )
}

/// Bring up a test server over the given hooks and modules
pub async fn server_with(
    config: ServerConfig,
    hooks: HookRegistry,
    modules: Vec<SchemaModule>,
) -> (TestServer, AppState, ServerHandle) {
    let (router, state, handle) = create_app(config, hooks, modules)
        .await
        .expect("test app starts");
    (TestServer::new(router).expect("test server"), state, handle)
}

/// Bring up a test server with default hooks and the widget module
pub async fn server() -> (TestServer, AppState, ServerHandle) {
    server_with(test_config(), HookRegistry::new(), vec![widget_module()]).await
}

/// Extract the token value from a Set-Cookie header string
pub fn cookie_token(set_cookie: &str) -> Option<String> {
    set_cookie
        .split(';')
        .next()?
        .strip_prefix("token=")
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}
