/**
 * Session Details Handler
 *
 * Returns the identity attached to the request after re-validation through
 * the session-details collaborator. The collaborator may override any field;
 * nulling the session id is the conventional way to signal lazy expiry,
 * which is why the core never cancels sessions on a timer.
 */

use axum::{extract::State, response::Json};

use crate::auth::handlers::types::SessionResponse;
use crate::error::ServerError;
use crate::hooks::SessionDetailsContext;
use crate::middleware::auth::AuthIdentity;
use crate::server::state::AppState;

/// Session details handler (GET {session})
///
/// # Returns
///
/// `200 OK` with `{peer_id, account_id, session_id}`; fields are `null`
/// when unauthenticated or nulled by the collaborator
///
/// # Errors
///
/// * `401 Unauthorized` - the collaborator reported an error
pub async fn session_details(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
) -> Result<Json<SessionResponse>, ServerError> {
    let mut ctx = SessionDetailsContext {
        peer_id: identity.peer_id,
        account_id: identity.account_id,
        session_id: identity.session_id,
    };
    state
        .hooks
        .auth
        .session_details(&mut ctx)
        .await
        .map_err(|e| ServerError::unauthorized(format!("failed to determine session: {e}")))?;

    Ok(Json(SessionResponse {
        peer_id: ctx.peer_id,
        account_id: ctx.account_id,
        session_id: ctx.session_id,
    }))
}
