//! Subscription & Notification Engine
//!
//! Change tracking and live notification delivery:
//!
//! - `record` - change records and interest matching
//! - `scope` - per-query scopes with commit/reject finalization
//! - `connection` - per-connection scopes, stale-sid batching, debounced
//!   NOTIFY flushes
//! - `debounce` - the cancellable timer primitive behind all batching
//! - `engine` - the connection registry and cross-process fan-out
//! - `stats` - cluster-wide aggregate statistics under the shared store lock

pub mod connection;
pub mod debounce;
pub mod engine;
pub mod record;
pub mod scope;
pub mod stats;

pub use connection::ConnectionScope;
pub use engine::SubscriptionEngine;
pub use record::{Arity, ChangeRecord, Operation};
pub use scope::QueryScope;
pub use stats::{AggregateStats, ClientCounter, RequestMeter, StatsSampler, SERVER_KEY};
