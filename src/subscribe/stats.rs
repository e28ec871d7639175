/**
 * Cluster Aggregate Statistics
 *
 * The `"server"` record in the shared store holds the cluster-wide gauges:
 * live client count, rolling request rates and rolling load averages over
 * five windows (10s, 1m, 10m, 1h, 10h).
 *
 * Every mutation of the record is bracketed by the store's acquire/release
 * lock for the full read-modify-write. Readers (the `_server` resolver) read
 * without the lock; the gauges are approximate by design.
 *
 * The periodic sampler runs only in the leader process. Client-count deltas
 * arrive from every process via the bus and are coalesced by a short
 * debounce before one locked merge applies them.
 */

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use crate::store::{BusEvent, EventBus, SharedStore, StoreError};
use crate::subscribe::debounce::Debouncer;
use crate::subscribe::record::ChangeRecord;

/// Key of the aggregate record in the shared store
pub const SERVER_KEY: &str = "server";

/// The five rolling windows: 10s, 1m, 10m, 1h, 10h
pub const WINDOWS: [Duration; 5] = [
    Duration::from_secs(10),
    Duration::from_secs(60),
    Duration::from_secs(600),
    Duration::from_secs(3600),
    Duration::from_secs(36000),
];

/// Cluster-wide gauges stored under the `"server"` key
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AggregateStats {
    pub name: String,
    pub version: String,
    /// Live duplex connections across all processes
    pub clients: i64,
    /// Requests per second, smoothed over each window
    pub requests: [f64; 5],
    /// System load, smoothed over each window
    pub load: [f64; 5],
}

impl AggregateStats {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            clients: 0,
            requests: [0.0; 5],
            load: [0.0; 5],
        }
    }
}

/// Per-process request counter drained by the sampler
pub struct RequestMeter {
    count: AtomicU64,
}

impl RequestMeter {
    pub fn new() -> Self {
        Self {
            count: AtomicU64::new(0),
        }
    }

    /// Count one handled request
    pub fn tick(&self) {
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    /// Take and reset the count accumulated since the last call
    pub fn take(&self) -> u64 {
        self.count.swap(0, Ordering::Relaxed)
    }
}

impl Default for RequestMeter {
    fn default() -> Self {
        Self::new()
    }
}

/// Read the aggregate record, tolerating absence and stale shape
async fn read_stats(
    store: &Arc<dyn SharedStore>,
    name: &str,
    version: &str,
) -> Result<AggregateStats, StoreError> {
    Ok(match store.get(SERVER_KEY).await? {
        Some(value) => serde_json::from_value(value)
            .unwrap_or_else(|_| AggregateStats::new(name, version)),
        None => AggregateStats::new(name, version),
    })
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// First field of /proc/loadavg; zero on hosts without it
fn system_load() -> f64 {
    std::fs::read_to_string("/proc/loadavg")
        .ok()
        .and_then(|s| s.split_whitespace().next().and_then(|v| v.parse().ok()))
        .unwrap_or(0.0)
}

/// Leader-only periodic sampler for request rates and system load
pub struct StatsSampler {
    store: Arc<dyn SharedStore>,
    bus: Arc<dyn EventBus>,
    meter: Arc<RequestMeter>,
    name: String,
    version: String,
    interval: Duration,
    is_leader: bool,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl StatsSampler {
    pub fn new(
        store: Arc<dyn SharedStore>,
        bus: Arc<dyn EventBus>,
        meter: Arc<RequestMeter>,
        name: impl Into<String>,
        version: impl Into<String>,
        interval: Duration,
        is_leader: bool,
    ) -> Arc<Self> {
        Arc::new(Self {
            store,
            bus,
            meter,
            name: name.into(),
            version: version.into(),
            interval,
            is_leader,
            task: Mutex::new(None),
        })
    }

    /// Start the periodic sampling task; a non-leader process stays idle
    pub fn start(self: &Arc<Self>) {
        if !self.is_leader {
            tracing::debug!("[Stats] not the leader, sampler idle");
            return;
        }
        let sampler = self.clone();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(sampler.interval);
            interval.tick().await;
            loop {
                interval.tick().await;
                if let Err(e) = sampler.sample().await {
                    tracing::warn!("[Stats] sample failed: {e}");
                }
            }
        });
        *self.task.lock().unwrap() = Some(handle);
    }

    /// Take one sample and merge it into the shared record
    ///
    /// A change record is emitted only for metrics whose window values
    /// actually moved, so idle clusters stay quiet.
    pub async fn sample(&self) -> Result<(), StoreError> {
        let request_rate = self.meter.take() as f64 / self.interval.as_secs_f64();
        let load = system_load();

        self.store.acquire().await?;
        let merged = self.merge(request_rate, load).await;
        self.store.release().await?;

        for record in merged? {
            if let Err(e) = self.bus.publish(BusEvent::Change(record)).await {
                tracing::warn!("[Stats] stats change not published: {e}");
            }
        }
        Ok(())
    }

    async fn merge(
        &self,
        request_rate: f64,
        load: f64,
    ) -> Result<Vec<ChangeRecord>, StoreError> {
        let mut stats = read_stats(&self.store, &self.name, &self.version).await?;
        let mut requests_changed = false;
        let mut load_changed = false;

        for (i, window) in WINDOWS.iter().enumerate() {
            let alpha = (self.interval.as_secs_f64() / window.as_secs_f64()).min(1.0);
            let next = round2(stats.requests[i] + alpha * (request_rate - stats.requests[i]));
            if next != stats.requests[i] {
                stats.requests[i] = next;
                requests_changed = true;
            }
            let next = round2(stats.load[i] + alpha * (load - stats.load[i]));
            if next != stats.load[i] {
                stats.load[i] = next;
                load_changed = true;
            }
        }

        let value =
            serde_json::to_value(&stats).map_err(|e| StoreError::Backend(e.to_string()))?;
        self.store.put(SERVER_KEY, value).await?;

        let mut records = Vec::new();
        if requests_changed {
            records.push(
                ChangeRecord::update_one("Server", "server").with_attrs(vec!["requests".into()]),
            );
        }
        if load_changed {
            records
                .push(ChangeRecord::update_one("Server", "server").with_attrs(vec!["load".into()]));
        }
        Ok(records)
    }

    /// Stop the sampling task deterministically
    pub async fn stop(&self) {
        let handle = self.task.lock().unwrap().take();
        if let Some(handle) = handle {
            handle.abort();
            let _ = handle.await;
        }
    }
}

struct CounterInner {
    pending: AtomicI64,
    store: Arc<dyn SharedStore>,
    bus: Arc<dyn EventBus>,
    name: String,
    version: String,
}

impl CounterInner {
    async fn apply(&self) {
        let delta = self.pending.swap(0, Ordering::SeqCst);
        if delta == 0 {
            return;
        }
        if let Err(e) = self.merge(delta).await {
            tracing::warn!("[Stats] client delta {delta} not applied: {e}");
        }
    }

    async fn merge(&self, delta: i64) -> Result<(), StoreError> {
        self.store.acquire().await?;
        let result = async {
            let mut stats = read_stats(&self.store, &self.name, &self.version).await?;
            stats.clients = (stats.clients + delta).max(0);
            let value =
                serde_json::to_value(&stats).map_err(|e| StoreError::Backend(e.to_string()))?;
            self.store.put(SERVER_KEY, value).await
        }
        .await;
        self.store.release().await?;
        result?;

        self.bus
            .publish(BusEvent::Change(
                ChangeRecord::update_one("Server", "server").with_attrs(vec!["clients".into()]),
            ))
            .await
    }
}

/// Debounced aggregator for live-connection-count deltas
///
/// Deltas from the bus accumulate in a pending counter; the debounce
/// coalesces bursts of connect/disconnect events into one locked merge.
pub struct ClientCounter {
    inner: Arc<CounterInner>,
    debouncer: Debouncer,
}

impl ClientCounter {
    pub fn new(
        store: Arc<dyn SharedStore>,
        bus: Arc<dyn EventBus>,
        name: impl Into<String>,
        version: impl Into<String>,
        delay: Duration,
    ) -> Arc<Self> {
        let inner = Arc::new(CounterInner {
            pending: AtomicI64::new(0),
            store,
            bus,
            name: name.into(),
            version: version.into(),
        });
        let flush_target = inner.clone();
        let debouncer = Debouncer::new(delay, move || {
            let inner = flush_target.clone();
            tokio::spawn(async move {
                inner.apply().await;
            });
        });
        Arc::new(Self { inner, debouncer })
    }

    /// Queue one delta for the next coalesced merge
    pub fn add(&self, delta: i64) {
        self.inner.pending.fetch_add(delta, Ordering::SeqCst);
        self.debouncer.trigger();
    }

    /// Stop the coalescing timer, discarding any pending window
    pub async fn stop(&self) {
        self.debouncer.stop().await;
    }
}
