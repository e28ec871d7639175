/**
 * Session Token Codec
 *
 * This module signs and verifies the session tokens that bind a peer, an
 * account and a session id with an expiry claim. Tokens are carried by the
 * caller in the Authorization header or the session cookie and re-verified
 * on every request.
 *
 * A token whose signature fails verification, or whose expiry has passed,
 * is treated as absent authentication by the callers of `verify_token`,
 * never as an error that aborts the request.
 */

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::auth::identity::Identity;

/// Signed session claims
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Long-lived peer identity
    pub peer_id: String,
    /// Account the session is bound to
    pub account_id: String,
    /// Session id
    pub session_id: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at time (Unix timestamp)
    pub iat: i64,
}

impl Claims {
    /// The identity this token resolves to
    pub fn identity(&self) -> Identity {
        Identity::resolved(&self.peer_id, &self.account_id, &self.session_id)
    }
}

/// Sign a session token
///
/// # Arguments
/// * `secret` - HMAC signing secret from the server configuration
/// * `peer_id` / `account_id` / `session_id` - the session triplet
/// * `ttl` - token lifetime, matching the session TTL
///
/// # Returns
/// Compact signed token string
pub fn sign_token(
    secret: &str,
    peer_id: &str,
    account_id: &str,
    session_id: &str,
    ttl: chrono::Duration,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now();
    let claims = Claims {
        peer_id: peer_id.to_string(),
        account_id: account_id.to_string(),
        session_id: session_id.to_string(),
        iat: now.timestamp(),
        exp: (now + ttl).timestamp(),
    };

    let key = EncodingKey::from_secret(secret.as_ref());
    encode(&Header::default(), &claims, &key)
}

/// Verify and decode a session token
///
/// # Returns
/// Decoded claims, or an error for a bad signature, malformed token or
/// passed expiry. Callers map the error to "no authentication attached".
pub fn verify_token(secret: &str, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let key = DecodingKey::from_secret(secret.as_ref());
    let validation = Validation::default();

    let token_data = decode::<Claims>(token, &key, &validation)?;
    Ok(token_data.claims)
}
