/**
 * Subscription Engine
 *
 * The per-process registry of live connection scopes. Connect/disconnect
 * manage a scope's lifecycle and publish client-count deltas on the
 * cross-process bus; `apply_change` fans one broadcast change record out to
 * every local connection for interest matching.
 *
 * The engine does not consume the bus itself; the server's dispatch task
 * feeds it (and the client counter) from a single bus subscription.
 */

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::store::{BusEvent, EventBus};
use crate::subscribe::connection::ConnectionScope;
use crate::subscribe::record::ChangeRecord;

/// Registry of live duplex connections in this process
pub struct SubscriptionEngine {
    connections: Mutex<HashMap<String, Arc<ConnectionScope>>>,
    bus: Arc<dyn EventBus>,
    notify_delay: Duration,
}

impl SubscriptionEngine {
    pub fn new(bus: Arc<dyn EventBus>, notify_delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            connections: Mutex::new(HashMap::new()),
            bus,
            notify_delay,
        })
    }

    /// Open the connection scope for a newly connected duplex transport
    ///
    /// Publishes a `+1` client delta so every process's aggregate count
    /// converges after the coalescing delay.
    pub async fn connect(
        &self,
        cid: impl Into<String>,
        notify: impl Fn(Vec<String>) + Send + Sync + 'static,
    ) -> Arc<ConnectionScope> {
        let cid = cid.into();
        let scope = ConnectionScope::new(cid.clone(), self.notify_delay, self.bus.clone(), notify);
        self.connections
            .lock()
            .unwrap()
            .insert(cid.clone(), scope.clone());
        tracing::info!("[Subscribe] connect: cid={cid}");

        if let Err(e) = self.bus.publish(BusEvent::ClientDelta(1)).await {
            tracing::warn!("[Subscribe] client delta not published: {e}");
        }
        scope
    }

    /// Destroy a connection scope on disconnect
    pub async fn disconnect(&self, cid: &str) {
        let scope = self.connections.lock().unwrap().remove(cid);
        let Some(scope) = scope else {
            return;
        };
        scope.destroy().await;
        tracing::info!("[Subscribe] disconnect: cid={cid}");

        if let Err(e) = self.bus.publish(BusEvent::ClientDelta(-1)).await {
            tracing::warn!("[Subscribe] client delta not published: {e}");
        }
    }

    /// Fan one change record out to every local connection
    pub fn apply_change(&self, record: &ChangeRecord) {
        let connections: Vec<Arc<ConnectionScope>> =
            self.connections.lock().unwrap().values().cloned().collect();
        for connection in connections {
            connection.apply(record);
        }
    }

    /// Look up a live connection scope by id
    pub fn connection(&self, cid: &str) -> Option<Arc<ConnectionScope>> {
        self.connections.lock().unwrap().get(cid).cloned()
    }

    /// Number of live connections in this process
    pub fn connection_count(&self) -> usize {
        self.connections.lock().unwrap().len()
    }

    /// Destroy every remaining connection scope on shutdown
    ///
    /// Scope destruction stops each flush timer; no deltas are published,
    /// the process is going away as a whole.
    pub async fn shutdown(&self) {
        let drained: Vec<Arc<ConnectionScope>> = self
            .connections
            .lock()
            .unwrap()
            .drain()
            .map(|(_, scope)| scope)
            .collect();
        for scope in drained {
            scope.destroy().await;
        }
    }
}
