/**
 * Session Cookie Helpers
 *
 * The session token travels in a `token` cookie scoped to the API base
 * path, HttpOnly, with a configurable `Secure` flag and a lifetime equal to
 * the session TTL. Logout (and only logout) clears it with a zero lifetime.
 *
 * Parsing is deliberately narrow: only the `token` cookie is ever read.
 */

use axum::http::{header, HeaderMap, HeaderValue};

use crate::server::config::ServerConfig;

/// Name of the session cookie
pub const COOKIE_NAME: &str = "token";

/// Build the Set-Cookie value issuing a session token
pub fn session_cookie(config: &ServerConfig, token: &str) -> HeaderValue {
    let mut cookie = format!(
        "{}={}; Max-Age={}; Path={}; HttpOnly",
        COOKIE_NAME,
        token,
        config.session_ttl.num_seconds(),
        config.base_path,
    );
    if config.cookie_secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie).unwrap_or_else(|_| HeaderValue::from_static(""))
}

/// Build the Set-Cookie value clearing the session cookie
pub fn clear_cookie(config: &ServerConfig) -> HeaderValue {
    let cookie = format!(
        "{}=; Max-Age=0; Path={}; HttpOnly",
        COOKIE_NAME, config.base_path,
    );
    HeaderValue::from_str(&cookie).unwrap_or_else(|_| HeaderValue::from_static(""))
}

/// Read the session token from the Cookie header, if present
pub fn token_from_cookies(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    raw.split(';')
        .map(str::trim)
        .find_map(|pair| pair.strip_prefix("token="))
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
