/**
 * Query Endpoint Handler
 *
 * The plain HTTP request/response endpoint (`POST {graph}`). Requests over
 * this transport execute without a change-tracking scope; the duplex
 * variant in the server module supplies one per connection.
 */

use axum::{extract::State, http::StatusCode, response::Json};

use crate::error::ServerError;
use crate::graph::pipeline;
use crate::middleware::auth::AuthIdentity;
use crate::server::state::AppState;

/// Query handler (POST {graph})
///
/// # Returns
///
/// `200 OK` with `{data}` on success or `{errors: [{message}]}` on
/// execution failure; execution errors are data, not transport failures
///
/// # Errors
///
/// * `400 Bad Request` - structurally malformed payload
pub async fn graph(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
    Json(payload): Json<serde_json::Value>,
) -> Result<(StatusCode, Json<serde_json::Value>), ServerError> {
    let envelope = pipeline::run(&state, payload, identity, None).await?;
    Ok((StatusCode::OK, Json(envelope)))
}
