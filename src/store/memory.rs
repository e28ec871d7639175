/**
 * In-Process Store and Bus
 *
 * Single-process implementations of the `SharedStore` and `EventBus` seams.
 * `MemoryStore` backs the key-value store with a map behind a semaphore-based
 * lock; `MemoryBus` rides on `tokio::sync::broadcast`.
 *
 * Cloning either handle shares the underlying state, which is how tests model
 * two worker processes sharing one store.
 */

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{broadcast, Mutex, Semaphore};

use crate::store::{BusEvent, EventBus, SharedStore, StoreError};

/// In-process key-value store with a semaphore-backed exclusion lock
///
/// The semaphore starts with one permit; `acquire` takes it and `release`
/// returns it, so the lock is held across suspension points between the two
/// calls. Unbalanced `release` calls would mint extra permits; callers keep
/// the acquire/release bracket strict.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    lock: Semaphore,
    data: Mutex<HashMap<String, serde_json::Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(StoreInner {
                lock: Semaphore::new(1),
                data: Mutex::new(HashMap::new()),
            }),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SharedStore for MemoryStore {
    async fn acquire(&self) -> Result<(), StoreError> {
        let permit = self
            .inner
            .lock
            .acquire()
            .await
            .map_err(|e| StoreError::Backend(format!("lock closed: {e}")))?;
        permit.forget();
        Ok(())
    }

    async fn release(&self) -> Result<(), StoreError> {
        self.inner.lock.add_permits(1);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, StoreError> {
        Ok(self.inner.data.lock().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: serde_json::Value) -> Result<(), StoreError> {
        self.inner.data.lock().await.insert(key.to_string(), value);
        Ok(())
    }
}

/// In-process broadcast bus
///
/// A thin wrapper over `tokio::sync::broadcast`; every subscriber receives a
/// copy of each event published after it subscribed, including events from
/// its own process (loopback keeps local and remote delivery uniform).
#[derive(Clone)]
pub struct MemoryBus {
    tx: broadcast::Sender<BusEvent>,
}

impl MemoryBus {
    pub fn new() -> Self {
        // Capacity of 1000 bounds a burst of change records per lagging subscriber
        let (tx, _) = broadcast::channel(1000);
        Self { tx }
    }
}

impl Default for MemoryBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventBus for MemoryBus {
    async fn publish(&self, event: BusEvent) -> Result<(), StoreError> {
        // No subscribers is not an error for a fire-and-forget bus
        let _ = self.tx.send(event);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<BusEvent> {
        self.tx.subscribe()
    }
}
