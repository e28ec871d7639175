//! Server Module
//!
//! Process-level wiring: configuration, the shared application state,
//! startup/shutdown, and the duplex (WebSocket) transport variant of the
//! query endpoint.

pub mod config;
pub mod init;
pub mod state;
pub mod ws;

pub use config::{AuthMode, ServerConfig};
pub use init::{build, create_app, ServerHandle};
pub use state::AppState;
