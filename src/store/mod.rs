/**
 * Shared State Store and Event Bus
 *
 * This module defines the two seams through which all cross-process
 * coordination flows:
 *
 * - `SharedStore` - key-value storage with an explicit acquire/release
 *   mutual-exclusion primitive bracketing read-modify-write sequences
 * - `EventBus` - a broadcast channel for fire-and-forget cross-process
 *   events, at most once per subscriber, ordered per publisher only
 *
 * The in-process implementations in `memory` are the single-process
 * defaults; a multi-worker deployment plugs a cross-process backend in
 * behind the same traits.
 */

pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;

use crate::subscribe::record::ChangeRecord;

pub use memory::{MemoryBus, MemoryStore};

/// Store/bus backend error
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store rejected or lost the operation
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Events carried on the cross-process bus
///
/// The bus gives no ordering guarantee across publishers; within one
/// publisher's stream order is preserved.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum BusEvent {
    /// A committed change record, fanned out to every live connection scope
    Change(ChangeRecord),
    /// A live-connection-count delta from some worker process
    ClientDelta(i64),
}

/// Cross-process key-value storage with explicit mutual exclusion
///
/// `acquire`/`release` bracket every read-modify-write of shared data.
/// Readers that tolerate stale values may call `get` without the lock.
#[async_trait]
pub trait SharedStore: Send + Sync {
    /// Take the store's mutual-exclusion lock
    ///
    /// Suspends until the lock is available. Every `acquire` must be paired
    /// with exactly one `release`.
    async fn acquire(&self) -> Result<(), StoreError>;

    /// Release the store's mutual-exclusion lock
    async fn release(&self) -> Result<(), StoreError>;

    /// Read a value by key
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, StoreError>;

    /// Write a value under a key
    async fn put(&self, key: &str, value: serde_json::Value) -> Result<(), StoreError>;
}

/// Cross-process broadcast bus
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Publish an event to all current subscribers
    async fn publish(&self, event: BusEvent) -> Result<(), StoreError>;

    /// Subscribe to the event stream from this point on
    fn subscribe(&self) -> broadcast::Receiver<BusEvent>;
}
