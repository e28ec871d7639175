/**
 * Collaborator Hook Registry
 *
 * The server core delegates everything it does not own to collaborators:
 * peer recognition, account authentication, session lifecycle, transaction
 * wrapping and result post-processing. This module defines the collaborator
 * traits and the registry object that carries them.
 *
 * The registry is constructed once at startup and passed into every
 * component; there is no process-wide hook singleton. Every trait method has
 * a default implementation, so an embedder only overrides the steps it
 * actually backs with real infrastructure.
 *
 * # Abort Semantics
 *
 * An auth collaborator aborts its chain by returning `Err(HookError)`; the
 * caller converts that into an authentication denial carrying the hook's
 * reason. No partial identity state survives an abort.
 */

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::BoxFuture;
use thiserror::Error;

use crate::error::ServerError;

/// Reason a collaborator aborted its step
#[derive(Debug, Error)]
#[error("{0}")]
pub struct HookError(pub String);

impl HookError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Result type returned by every auth collaborator step
pub type HookResult = Result<(), HookError>;

/// Context for the recognize-peer step
///
/// `peer_id` arrives as the caller-supplied hint (if any) and leaves as the
/// recognized identity; left unset, the core falls back to `"unknown"`.
#[derive(Debug, Default)]
pub struct PeerContext {
    pub peer_id: Option<String>,
}

/// Context for the authenticate-account step
///
/// Credentials may be absent; a collaborator that leaves `account_id` unset
/// resolves the caller to the anonymous account.
#[derive(Debug, Default)]
pub struct AccountContext {
    pub username: Option<String>,
    pub password: Option<String>,
    pub account_id: Option<String>,
}

/// Context for the create-session step
///
/// The collaborator may supply `session_id`; left unset, the core generates
/// a random unique one. `ttl` is the configured session lifetime.
#[derive(Debug)]
pub struct SessionContext {
    pub peer_id: String,
    pub account_id: String,
    pub ttl: chrono::Duration,
    pub session_id: Option<String>,
}

/// Context for the session-details step
///
/// Carries whatever identity is attached to the request (fields may be
/// `None` when unauthenticated). The collaborator may override any field,
/// e.g. nulling `session_id` to signal lazy expiry.
#[derive(Debug, Default)]
pub struct SessionDetailsContext {
    pub peer_id: Option<String>,
    pub account_id: Option<String>,
    pub session_id: Option<String>,
}

/// Context for the destroy-session step
///
/// Destruction is idempotent: a collaborator must not report an error for a
/// session that no longer exists.
#[derive(Debug)]
pub struct SessionDestroyContext {
    pub session_id: String,
}

/// The authentication collaborator
///
/// Implementors back the five steps of the auth state machine with real
/// peer/account/session storage. All methods default to no-ops, which yields
/// the zero-infrastructure behavior: every caller becomes an anonymous
/// account on a generated session.
#[async_trait]
pub trait AuthCollaborator: Send + Sync {
    /// Recognize or create the long-lived peer identity
    async fn recognize_peer(&self, _ctx: &mut PeerContext) -> HookResult {
        Ok(())
    }

    /// Resolve credentials to an account
    async fn authenticate_account(&self, _ctx: &mut AccountContext) -> HookResult {
        Ok(())
    }

    /// Create a session binding (peer, account) with the configured TTL
    async fn create_session(&self, _ctx: &mut SessionContext) -> HookResult {
        Ok(())
    }

    /// Re-validate and optionally override the attached identity
    async fn session_details(&self, _ctx: &mut SessionDetailsContext) -> HookResult {
        Ok(())
    }

    /// Destroy a session (idempotent)
    async fn destroy_session(&self, _ctx: &mut SessionDestroyContext) -> HookResult {
        Ok(())
    }
}

/// The default collaborator: anonymous sessions, no backing store
pub struct DefaultCollaborator;

#[async_trait]
impl AuthCollaborator for DefaultCollaborator {}

/// Opaque transaction handle passed through to resolver contexts
///
/// The wrapper owns the handle's real type; the core never inspects it.
pub type TxHandle = Arc<dyn Any + Send + Sync>;

/// The work function executed inside a transaction
pub type TxWork = Box<
    dyn FnOnce(Option<TxHandle>) -> BoxFuture<'static, Result<serde_json::Value, ServerError>>
        + Send,
>;

/// Transaction wrapper collaborator
///
/// The pipeline invokes the wrapper for every request, with or without a
/// persistence layer behind it, so call sites never special-case. The
/// wrapper owns its own timeout/rollback semantics; the core only
/// distinguishes success from failure of the wrapped work.
#[async_trait]
pub trait TransactionWrapper: Send + Sync {
    async fn run(&self, work: TxWork) -> Result<serde_json::Value, ServerError>;
}

/// Pass-through wrapper used when no persistence layer is configured
///
/// Runs the work immediately with no transaction handle.
pub struct PassthroughTransaction;

#[async_trait]
impl TransactionWrapper for PassthroughTransaction {
    async fn run(&self, work: TxWork) -> Result<serde_json::Value, ServerError> {
        work(None).await
    }
}

/// Result post-processing collaborator
///
/// `process_success` may reshape a successful engine result before it is
/// returned; `process_error` normalizes failure messages into the response
/// envelope. The defaults pass results through and produce the standard
/// `{ "errors": [{ "message": ... }] }` shape.
pub trait ResultProcessor: Send + Sync {
    fn process_success(&self, result: serde_json::Value) -> serde_json::Value {
        result
    }

    fn process_error(&self, messages: Vec<String>) -> serde_json::Value {
        let errors: Vec<serde_json::Value> = messages
            .into_iter()
            .map(|message| serde_json::json!({ "message": message }))
            .collect();
        serde_json::json!({ "errors": errors })
    }
}

/// The default result processor
pub struct DefaultProcessor;

impl ResultProcessor for DefaultProcessor {}

/// The collaborator registry handed to every component at startup
#[derive(Clone)]
pub struct HookRegistry {
    pub auth: Arc<dyn AuthCollaborator>,
    pub transaction: Arc<dyn TransactionWrapper>,
    pub results: Arc<dyn ResultProcessor>,
}

impl HookRegistry {
    /// Create a registry with all-default collaborators
    pub fn new() -> Self {
        Self {
            auth: Arc::new(DefaultCollaborator),
            transaction: Arc::new(PassthroughTransaction),
            results: Arc::new(DefaultProcessor),
        }
    }

    /// Replace the auth collaborator
    pub fn with_auth(mut self, auth: Arc<dyn AuthCollaborator>) -> Self {
        self.auth = auth;
        self
    }

    /// Replace the transaction wrapper
    pub fn with_transaction(mut self, transaction: Arc<dyn TransactionWrapper>) -> Self {
        self.transaction = transaction;
        self
    }

    /// Replace the result processor
    pub fn with_results(mut self, results: Arc<dyn ResultProcessor>) -> Self {
        self.results = results;
        self
    }
}

impl Default for HookRegistry {
    fn default() -> Self {
        Self::new()
    }
}
