/**
 * Resolved Request Identity
 *
 * The identity attached to a request after token verification or implicit
 * provisioning. All fields are optional: an unauthenticated request carries
 * an identity with every field `None`.
 */

use serde::{Deserialize, Serialize};

/// The well-known account id used when no credentials resolve
pub const ANONYMOUS_ACCOUNT: &str = "anonymous";

/// The fallback peer id used when recognition leaves the peer unset
pub const UNKNOWN_PEER: &str = "unknown";

/// Identity resolved for one request
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    /// Long-lived pseudonymous device identity
    pub peer_id: Option<String>,
    /// Authenticated (or anonymous) principal
    pub account_id: Option<String>,
    /// TTL-bounded session binding the two
    pub session_id: Option<String>,
}

impl Identity {
    /// An identity with every field resolved
    pub fn resolved(
        peer_id: impl Into<String>,
        account_id: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            peer_id: Some(peer_id.into()),
            account_id: Some(account_id.into()),
            session_id: Some(session_id.into()),
        }
    }

    /// Whether any identity is attached at all
    pub fn is_authenticated(&self) -> bool {
        self.session_id.is_some()
    }
}
