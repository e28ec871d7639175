/**
 * Server Configuration
 *
 * Configuration is loaded from environment variables with development
 * defaults, so a bare `cargo run` brings up a working single-process
 * server. The endpoint paths keep their conventional defaults
 * (`/auth/login`, `/auth/session`, `/auth/logout`, `/data/graph`) under the
 * API base path.
 *
 * `is_leader` marks the one process of a worker pool that runs the periodic
 * stats sampler; the process-topology layer of the deployment decides which
 * process that is. A single-process deployment is its own leader.
 */

use std::time::Duration;

/// How the middleware treats requests without a valid token
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthMode {
    /// Silently provision an anonymous session (zero-friction default)
    Try,
    /// Verify an attached token only; never provision
    Verify,
}

/// Runtime configuration for one server process
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Server name reported through introspection
    pub name: String,
    /// Server version reported through introspection
    pub version: String,
    pub host: String,
    pub port: u16,
    /// API base path; all endpoints and the session cookie are scoped to it
    pub base_path: String,
    pub login_path: String,
    pub session_path: String,
    pub logout_path: String,
    pub graph_path: String,
    /// HMAC secret signing session tokens
    pub token_secret: String,
    /// Session (and token, and cookie) lifetime
    pub session_ttl: chrono::Duration,
    /// Whether the session cookie carries the `Secure` attribute
    pub cookie_secure: bool,
    pub auth_mode: AuthMode,
    /// Debounce window for notification flushes per connection
    pub notify_delay: Duration,
    /// Coalescing window for client-count deltas
    pub client_delta_delay: Duration,
    /// Period of the leader's stats sampler
    pub stats_interval: Duration,
    /// Whether this process runs the periodic stats sampler
    pub is_leader: bool,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl ServerConfig {
    /// Load configuration from the environment
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            name: env_or("SERVER_NAME", &defaults.name),
            version: defaults.version.clone(),
            host: env_or("SERVER_HOST", &defaults.host),
            port: env_parse("SERVER_PORT", defaults.port),
            base_path: env_or("SERVER_BASE_PATH", &defaults.base_path),
            login_path: env_or("SERVER_LOGIN_PATH", &defaults.login_path),
            session_path: env_or("SERVER_SESSION_PATH", &defaults.session_path),
            logout_path: env_or("SERVER_LOGOUT_PATH", &defaults.logout_path),
            graph_path: env_or("SERVER_GRAPH_PATH", &defaults.graph_path),
            token_secret: env_or("TOKEN_SECRET", &defaults.token_secret),
            session_ttl: chrono::Duration::seconds(env_parse(
                "SESSION_TTL_SECONDS",
                defaults.session_ttl.num_seconds(),
            )),
            cookie_secure: env_parse("COOKIE_SECURE", defaults.cookie_secure),
            auth_mode: match env_or("AUTH_MODE", "try").as_str() {
                "verify" => AuthMode::Verify,
                _ => AuthMode::Try,
            },
            notify_delay: Duration::from_millis(env_parse("NOTIFY_DELAY_MS", 100)),
            client_delta_delay: Duration::from_millis(env_parse("CLIENT_DELTA_DELAY_MS", 250)),
            stats_interval: Duration::from_secs(env_parse("STATS_INTERVAL_SECONDS", 10)),
            is_leader: env_parse("CLUSTER_LEADER", defaults.is_leader),
        }
    }

    /// Join an endpoint path onto the API base path
    pub fn route(&self, path: &str) -> String {
        format!("{}{}", self.base_path, path)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "graphwire".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            host: "127.0.0.1".to_string(),
            port: 8080,
            base_path: "/api".to_string(),
            login_path: "/auth/login".to_string(),
            session_path: "/auth/session".to_string(),
            logout_path: "/auth/logout".to_string(),
            graph_path: "/data/graph".to_string(),
            token_secret: "graphwire-dev-secret".to_string(),
            session_ttl: chrono::Duration::days(7),
            cookie_secure: false,
            auth_mode: AuthMode::Try,
            notify_delay: Duration::from_millis(100),
            client_delta_delay: Duration::from_millis(250),
            stats_interval: Duration::from_secs(10),
            is_leader: true,
        }
    }
}
