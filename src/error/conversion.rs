/**
 * Error Conversion
 *
 * This module converts server errors into HTTP responses so that handlers
 * can return `Result<_, ServerError>` directly.
 *
 * # Response Format
 *
 * Transport-level errors (bad request, unauthorized, internal) are returned
 * as JSON with the error message and status:
 * ```json
 * {
 *   "error": "unauthorized: failed to create new session: no backend",
 *   "status": 401
 * }
 * ```
 *
 * Execution errors are NOT converted here; the pipeline turns them into a
 * `{ "errors": [...] }` envelope with transport success before they reach
 * the response layer.
 */

use axum::{
    body::Body,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::error::types::ServerError;

impl IntoResponse for ServerError {
    /// Convert a server error into an HTTP response
    ///
    /// Execution-class errors falling through to this point are shaped as an
    /// `errors` envelope with status 200, keeping the transport contract
    /// uniform for clients that did not go through the pipeline.
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = if status == StatusCode::OK {
            let errors: Vec<serde_json::Value> = self
                .messages()
                .into_iter()
                .map(|message| serde_json::json!({ "message": message }))
                .collect();
            serde_json::json!({ "errors": errors })
        } else {
            serde_json::json!({
                "error": self.to_string(),
                "status": status.as_u16(),
            })
        };

        Response::builder()
            .status(status)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap_or_else(|_| {
                Response::builder()
                    .status(StatusCode::INTERNAL_SERVER_ERROR)
                    .body(Body::from("Internal Server Error"))
                    .unwrap()
            })
    }
}
