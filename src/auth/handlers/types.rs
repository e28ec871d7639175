/**
 * Authentication Handler Types
 *
 * Request and response bodies for the login, session and logout endpoints.
 */

use serde::{Deserialize, Serialize};

/// Login request
///
/// All fields are optional: absent or empty credentials resolve to the
/// anonymous account, and the peer id is only a hint for the recognize step.
#[derive(Deserialize, Serialize, Debug, Default)]
pub struct LoginRequest {
    /// Caller-supplied peer identity hint
    #[serde(default)]
    pub peer_id: Option<String>,
    /// Account username
    #[serde(default)]
    pub username: Option<String>,
    /// Account password
    #[serde(default)]
    pub password: Option<String>,
}

/// Login response
///
/// The same token is also issued as a session cookie.
#[derive(Serialize, Deserialize, Debug)]
pub struct LoginResponse {
    /// Signed session token
    pub token: String,
    /// Recognized peer identity, stable across sessions
    pub peer: String,
}

/// Session details response
///
/// Fields are `null` when the request carried no valid authentication or a
/// collaborator nulled them (e.g. on lazy session expiry).
#[derive(Serialize, Deserialize, Debug)]
pub struct SessionResponse {
    pub peer_id: Option<String>,
    pub account_id: Option<String>,
    pub session_id: Option<String>,
}
