/**
 * Authentication Middleware
 *
 * This middleware resolves the identity attached to each request:
 *
 * 1. Extract the session token from the `Authorization: Bearer` header or
 *    the `token` cookie
 * 2. Verify it; a missing, malformed, badly signed or expired token is
 *    treated as ABSENT authentication, never as a request-aborting error
 * 3. In `Try` auth mode, a request without identity is silently provisioned:
 *    the same recognize/authenticate/create-session chain as login runs with
 *    empty credentials, and the resulting cookie is issued on the response
 * 4. The resolved `Identity` is attached to request extensions for handlers
 *
 * `attach_identity` is the lighter variant used by logout: it verifies an
 * attached token but never provisions a new session.
 */

use axum::{
    extract::{Request, State},
    http::header::{AUTHORIZATION, SET_COOKIE},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::auth::cookie::{session_cookie, token_from_cookies};
use crate::auth::handlers::login::establish_session;
use crate::auth::identity::Identity;
use crate::auth::tokens::verify_token;
use crate::server::config::AuthMode;
use crate::server::state::AppState;

/// Extract the raw token from the Authorization header or the cookie
fn attached_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_string)
        .or_else(|| token_from_cookies(headers))
}

/// Resolve the identity carried by the request, if any
fn verified_identity(state: &AppState, headers: &HeaderMap) -> Option<Identity> {
    let token = attached_token(headers)?;
    match verify_token(&state.config.token_secret, &token) {
        Ok(claims) => Some(claims.identity()),
        Err(e) => {
            // Invalid or expired tokens count as absent authentication
            tracing::debug!("[Auth] ignoring unverifiable token: {e}");
            None
        }
    }
}

/// Try-mode authentication middleware with implicit provisioning
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let mut issued_token = None;

    let identity = match verified_identity(&state, request.headers()) {
        Some(identity) => identity,
        None if state.config.auth_mode == AuthMode::Try => {
            match establish_session(&state.config, &state.hooks, None, None, None).await {
                Ok((identity, token)) => {
                    tracing::debug!("[Auth] implicit session provisioned");
                    issued_token = Some(token);
                    identity
                }
                Err(e) => {
                    tracing::warn!("[Auth] implicit provisioning failed: {e}");
                    Identity::default()
                }
            }
        }
        None => Identity::default(),
    };

    request.extensions_mut().insert(identity);
    let mut response = next.run(request).await;

    if let Some(token) = issued_token {
        response
            .headers_mut()
            .append(SET_COOKIE, session_cookie(&state.config, &token));
    }
    response
}

/// Verification-only middleware (no implicit provisioning)
pub async fn attach_identity(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let identity = verified_identity(&state, request.headers()).unwrap_or_default();
    request.extensions_mut().insert(identity);
    next.run(request).await
}

/// Axum extractor for the attached identity
///
/// Yields an empty identity when no middleware ran, so handlers never fail
/// merely because the route is reachable without authentication.
#[derive(Clone, Debug)]
pub struct AuthIdentity(pub Identity);

impl axum::extract::FromRequestParts<AppState> for AuthIdentity {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let identity = parts
            .extensions
            .get::<Identity>()
            .cloned()
            .unwrap_or_default();
        Ok(AuthIdentity(identity))
    }
}
