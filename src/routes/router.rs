/**
 * Router Configuration
 *
 * Route assembly for the four endpoints of the wire surface:
 *
 * - `POST {login}` - no middleware; the handler runs the auth chain itself
 * - `GET {session}` / `GET {logout}` - verification-only middleware, so an
 *   absent or invalid token yields null identity fields rather than a
 *   silently provisioned session
 * - `POST|GET {graph}` - try-mode middleware with implicit provisioning;
 *   GET upgrades to the duplex transport
 *
 * All paths come from the configuration, joined onto the API base path.
 */

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::auth::handlers::{login, logout, session_details};
use crate::graph::handler::graph;
use crate::middleware::auth::{attach_identity, auth_middleware};
use crate::server::state::AppState;
use crate::server::ws::ws_upgrade;

/// Create the router with all routes configured
pub fn create_router(state: AppState) -> Router<()> {
    let config = &state.config;

    let graph_routes = Router::new()
        .route(&config.route(&config.graph_path), post(graph).get(ws_upgrade))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let session_routes = Router::new()
        .route(&config.route(&config.session_path), get(session_details))
        .route(&config.route(&config.logout_path), get(logout))
        .layer(middleware::from_fn_with_state(state.clone(), attach_identity));

    Router::new()
        .route(&config.route(&config.login_path), post(login))
        .merge(graph_routes)
        .merge(session_routes)
        .layer(TraceLayer::new_for_http())
        .fallback(|| async { (axum::http::StatusCode::NOT_FOUND, "404 Not Found") })
        .with_state(state)
}
