// Increase recursion limit for complex async operations
#![recursion_limit = "256"]

//! Graphwire - Main Library
//!
//! Graphwire is a query-API server framework. Independently developed feature
//! modules contribute fragments of one shared schema and resolver set, callers
//! are authenticated through short-lived session tokens bound to a long-lived
//! peer identity, queries run inside an optional transactional wrapper, and
//! change notifications are pushed to live subscribers over a duplex
//! (WebSocket) transport.
//!
//! # Module Structure
//!
//! - **`schema`** - Schema/resolver composition with collision detection
//! - **`auth`** - Login/session/logout endpoints and the token codec
//! - **`middleware`** - Try-mode authentication and implicit session provisioning
//! - **`graph`** - The per-request execution pipeline and the engine seam
//! - **`subscribe`** - Connection scopes, change records, notification batching,
//!   and cluster aggregate statistics
//! - **`store`** - The shared key-value store and cross-process event bus seams
//! - **`server`** - Configuration, application state, startup and the duplex
//!   transport
//! - **`routes`** - Router assembly
//! - **`hooks`** - The collaborator registry (auth, transaction, result
//!   post-processing)
//! - **`error`** - The server error taxonomy and HTTP conversion

pub mod auth;
pub mod error;
pub mod graph;
pub mod hooks;
pub mod middleware;
pub mod routes;
pub mod schema;
pub mod server;
pub mod store;
pub mod subscribe;

pub use error::ServerError;
pub use hooks::HookRegistry;
pub use schema::{ComposedSchema, Contribution, SchemaModule};
pub use server::config::ServerConfig;
pub use server::init::{create_app, ServerHandle};
