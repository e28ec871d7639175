/**
 * Logout Handler
 *
 * Requests session destruction through the collaborator when a session is
 * attached, and unconditionally clears the session cookie. Destruction is
 * idempotent: logging out twice with the same (now-destroyed) session never
 * produces an error on the second call, because the second request carries
 * the session id of a session the collaborator simply no longer knows.
 */

use axum::{extract::State, http::header::SET_COOKIE, http::StatusCode};

use crate::auth::cookie::clear_cookie;
use crate::error::ServerError;
use crate::hooks::SessionDestroyContext;
use crate::middleware::auth::AuthIdentity;
use crate::server::state::AppState;

/// Logout handler (GET {logout})
///
/// # Returns
///
/// `204 No Content` with the session cookie cleared
///
/// # Errors
///
/// * `401 Unauthorized` - the destroy collaborator reported an error
///   (absence of the session is not an error)
pub async fn logout(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
) -> Result<impl axum::response::IntoResponse, ServerError> {
    if let Some(session_id) = identity.session_id {
        let mut ctx = SessionDestroyContext { session_id };
        state
            .hooks
            .auth
            .destroy_session(&mut ctx)
            .await
            .map_err(|e| ServerError::unauthorized(format!("failed to logout: {e}")))?;
        tracing::info!("[Auth] logout: session destroyed");
    }

    Ok((
        StatusCode::NO_CONTENT,
        [(SET_COOKIE, clear_cookie(&state.config))],
    ))
}
