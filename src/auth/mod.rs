//! Authentication Module
//!
//! This module contains the auth state machine endpoints (login, session
//! details, logout), the signed session-token codec, the resolved identity
//! type and the session cookie helpers.
//!
//! The state machine runs Unauthenticated → Peer-Recognized →
//! Account-Resolved → Session-Established → Authenticated; every step is
//! delegated to the `AuthCollaborator` from the hook registry, and any hook
//! error exits to a denial carrying the hook's reason.

pub mod cookie;
pub mod handlers;
pub mod identity;
pub mod tokens;

pub use identity::{Identity, ANONYMOUS_ACCOUNT, UNKNOWN_PEER};
pub use tokens::{sign_token, verify_token, Claims};
