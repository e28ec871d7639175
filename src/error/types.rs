/**
 * Server Error Types
 *
 * This module defines the error taxonomy used across the server core.
 *
 * # Error Classes
 *
 * - `BadRequest` - malformed payload, rejected before any auth or execution work
 * - `Unauthorized` - an auth-chain collaborator signaled an error
 * - `DuplicateBinding` - two resolvers registered for the same (type, field)
 *   pair during schema composition; fatal at startup
 * - `Composition` - any other fatal schema composition failure
 * - `Execution` - the query executed but produced errors; converted to a
 *   normal response carrying an `errors` array
 * - `Internal` - a collaborator failed unexpectedly
 *
 * Execution-time errors never propagate as transport-level failures; the
 * pipeline converts them into an `errors` envelope with transport success.
 */

use axum::http::StatusCode;
use thiserror::Error;

/// Server-wide error type
///
/// Each variant carries enough context to produce a response, and
/// `status_code()` maps it to the transport status used when the error
/// surfaces at the HTTP layer directly.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Structurally malformed request payload
    #[error("bad request: {message}")]
    BadRequest {
        /// Human-readable reason
        message: String,
    },

    /// Authentication chain denied the request
    #[error("unauthorized: {message}")]
    Unauthorized {
        /// Explicit denial reason returned to the caller
        message: String,
    },

    /// A resolver was registered twice for the same (type, field) pair
    ///
    /// Raised during schema composition; aborts startup and is never
    /// produced per request.
    #[error("resolver for {type_name}.{field} already exists")]
    DuplicateBinding {
        /// Offending type name (`root` for the root pseudo-type)
        type_name: String,
        /// Offending field name
        field: String,
    },

    /// Any other fatal schema composition failure
    #[error("schema composition failed: {message}")]
    Composition {
        /// Human-readable reason
        message: String,
    },

    /// The query executed but produced errors
    #[error("execution failed: {}", messages.join("; "))]
    Execution {
        /// One message per error produced by the execution engine
        messages: Vec<String>,
    },

    /// A collaborator or subsystem failed unexpectedly
    #[error("internal error: {message}")]
    Internal {
        /// Human-readable reason, logged and surfaced in execution shape
        message: String,
    },

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ServerError {
    /// Create a new bad-request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Create a new unauthorized error with an explicit denial reason
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Create a new duplicate-binding error for a (type, field) pair
    pub fn duplicate_binding(type_name: impl Into<String>, field: impl Into<String>) -> Self {
        Self::DuplicateBinding {
            type_name: type_name.into(),
            field: field.into(),
        }
    }

    /// Create a new composition error
    pub fn composition(message: impl Into<String>) -> Self {
        Self::Composition {
            message: message.into(),
        }
    }

    /// Create a new execution error from one or more messages
    pub fn execution(messages: Vec<String>) -> Self {
        Self::Execution { messages }
    }

    /// Create a new internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    ///
    /// # Status Code Mapping
    ///
    /// - `BadRequest` - 400 Bad Request
    /// - `Unauthorized` - 401 Unauthorized
    /// - `DuplicateBinding` / `Composition` - 500 (these abort startup and
    ///   should never surface on a request path)
    /// - `Execution` - 200 OK; execution errors are data, not transport
    ///   failures
    /// - `Internal` / `Serialization` - 500 Internal Server Error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::DuplicateBinding { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Composition { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Execution { .. } => StatusCode::OK,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error messages in execution-envelope shape
    ///
    /// Every error class can be flattened into the `errors` array of a
    /// response envelope; multi-message variants keep one entry per message.
    pub fn messages(&self) -> Vec<String> {
        match self {
            Self::Execution { messages } => messages.clone(),
            other => vec![other.to_string()],
        }
    }
}
