//! Request Middleware
//!
//! Middleware for attaching a resolved identity to every request: token
//! extraction (header or cookie), try-mode verification and the implicit
//! auto-provisioning path.

pub mod auth;

pub use auth::{attach_identity, auth_middleware, AuthIdentity};
