/**
 * Login Handler
 *
 * This module implements the authentication chain and its HTTP endpoint.
 *
 * # Authentication Process
 *
 * 1. Recognize or create the peer (collaborator; falls back to "unknown")
 * 2. Authenticate the account (collaborator; absent credentials resolve to
 *    the anonymous account)
 * 3. Create a session with the configured TTL (collaborator id, or a
 *    generated UUID)
 * 4. Sign a session token and return it as payload and cookie
 *
 * A collaborator error at any step aborts with an authentication denial
 * carrying the step's reason; no partial identity is retained. The same
 * chain backs both the explicit endpoint and the middleware's implicit
 * (silent) provisioning path.
 */

use axum::{extract::State, http::header::SET_COOKIE, http::StatusCode, response::Json};
use uuid::Uuid;

use crate::auth::cookie::session_cookie;
use crate::auth::handlers::types::{LoginRequest, LoginResponse};
use crate::auth::identity::{Identity, ANONYMOUS_ACCOUNT, UNKNOWN_PEER};
use crate::auth::tokens::sign_token;
use crate::error::ServerError;
use crate::hooks::{AccountContext, HookRegistry, PeerContext, SessionContext};
use crate::server::config::ServerConfig;
use crate::server::state::AppState;

/// Run the recognize → authenticate → create-session chain
///
/// Returns the fully resolved identity and its signed token. Shared between
/// the login endpoint and the implicit-auth middleware path.
pub async fn establish_session(
    config: &ServerConfig,
    hooks: &HookRegistry,
    peer_hint: Option<String>,
    username: Option<String>,
    password: Option<String>,
) -> Result<(Identity, String), ServerError> {
    // Step 1: recognize the peer
    let mut peer_ctx = PeerContext { peer_id: peer_hint };
    hooks
        .auth
        .recognize_peer(&mut peer_ctx)
        .await
        .map_err(|e| ServerError::unauthorized(format!("failed to authenticate peer: {e}")))?;
    let peer_id = peer_ctx.peer_id.unwrap_or_else(|| UNKNOWN_PEER.to_string());

    // Step 2: resolve the account
    let mut account_ctx = AccountContext {
        username,
        password,
        account_id: None,
    };
    hooks
        .auth
        .authenticate_account(&mut account_ctx)
        .await
        .map_err(|e| {
            ServerError::unauthorized(format!("failed to authenticate username/password: {e}"))
        })?;
    let account_id = account_ctx
        .account_id
        .unwrap_or_else(|| ANONYMOUS_ACCOUNT.to_string());

    // Step 3: create the session
    let mut session_ctx = SessionContext {
        peer_id: peer_id.clone(),
        account_id: account_id.clone(),
        ttl: config.session_ttl,
        session_id: None,
    };
    hooks
        .auth
        .create_session(&mut session_ctx)
        .await
        .map_err(|e| ServerError::unauthorized(format!("failed to create new session: {e}")))?;
    let session_id = session_ctx
        .session_id
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    // Step 4: issue the token
    let token = sign_token(
        &config.token_secret,
        &peer_id,
        &account_id,
        &session_id,
        config.session_ttl,
    )
    .map_err(|e| ServerError::internal(format!("failed to sign token: {e}")))?;

    Ok((Identity::resolved(peer_id, account_id, session_id), token))
}

/// Login handler (POST {login})
///
/// # Returns
///
/// `201 Created` with `{token, peer}` and a session cookie
///
/// # Errors
///
/// * `401 Unauthorized` - a collaborator denied any step of the chain
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<impl axum::response::IntoResponse, ServerError> {
    let (identity, token) = establish_session(
        &state.config,
        &state.hooks,
        request.peer_id,
        request.username,
        request.password,
    )
    .await?;

    let peer = identity.peer_id.unwrap_or_else(|| UNKNOWN_PEER.to_string());
    tracing::info!("[Auth] login: peer={}, session established", peer);

    Ok((
        StatusCode::CREATED,
        [(SET_COOKIE, session_cookie(&state.config, &token))],
        Json(LoginResponse { token, peer }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::tokens::verify_token;
    use crate::hooks::{AuthCollaborator, HookError, HookResult};
    use async_trait::async_trait;

    struct FixedSessionBackend;

    #[async_trait]
    impl AuthCollaborator for FixedSessionBackend {
        async fn authenticate_account(&self, ctx: &mut AccountContext) -> HookResult {
            match (&ctx.username, &ctx.password) {
                (Some(u), Some(p)) if u == "admin" && p == "secret" => {
                    ctx.account_id = Some("acct-admin".to_string());
                    Ok(())
                }
                (Some(_), _) => Err(HookError::new("unknown username")),
                _ => Ok(()),
            }
        }

        async fn create_session(&self, ctx: &mut SessionContext) -> HookResult {
            ctx.session_id = Some(format!("sess-{}", ctx.account_id));
            Ok(())
        }
    }

    fn config() -> ServerConfig {
        ServerConfig::default()
    }

    #[tokio::test]
    async fn test_establish_session_anonymous() {
        let hooks = HookRegistry::new();
        let (identity, token) = establish_session(&config(), &hooks, None, None, None)
            .await
            .unwrap();
        assert_eq!(identity.account_id.as_deref(), Some(ANONYMOUS_ACCOUNT));
        assert_eq!(identity.peer_id.as_deref(), Some(UNKNOWN_PEER));

        let claims = verify_token(&config().token_secret, &token).unwrap();
        assert_eq!(Some(claims.session_id), identity.session_id);
    }

    #[tokio::test]
    async fn test_establish_session_with_backend() {
        let hooks = HookRegistry::new().with_auth(std::sync::Arc::new(FixedSessionBackend));
        let (identity, _) = establish_session(
            &config(),
            &hooks,
            Some("device-7".to_string()),
            Some("admin".to_string()),
            Some("secret".to_string()),
        )
        .await
        .unwrap();
        assert_eq!(identity.peer_id.as_deref(), Some("device-7"));
        assert_eq!(identity.account_id.as_deref(), Some("acct-admin"));
        assert_eq!(identity.session_id.as_deref(), Some("sess-acct-admin"));
    }

    #[tokio::test]
    async fn test_establish_session_denied() {
        let hooks = HookRegistry::new().with_auth(std::sync::Arc::new(FixedSessionBackend));
        let result = establish_session(
            &config(),
            &hooks,
            None,
            Some("nobody".to_string()),
            None,
        )
        .await;
        match result {
            Err(ServerError::Unauthorized { message }) => {
                assert!(message.contains("failed to authenticate username/password"));
            }
            other => panic!("expected Unauthorized, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_token_matches_identity_triplet() {
        let hooks = HookRegistry::new();
        let (identity, token) = establish_session(&config(), &hooks, None, None, None)
            .await
            .unwrap();
        let claims = verify_token(&config().token_secret, &token).unwrap();
        assert_eq!(claims.identity(), identity);
    }
}
