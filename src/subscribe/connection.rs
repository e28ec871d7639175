/**
 * Connection Scope
 *
 * One scope per live duplex connection. It owns the connection's
 * subscriptions (one per distinct query, keyed by sid), the set of sids that
 * became stale since the last delivery, and the debounce timer that flushes
 * that set as a single NOTIFY batch.
 *
 * Change records arrive from the cross-process bus via `apply`; matching is
 * done against each subscription's interest set. Stale sids accumulate with
 * set semantics, so however many records match within one debounce window,
 * each subscription is delivered at most once per flush.
 */

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::store::EventBus;
use crate::subscribe::debounce::Debouncer;
use crate::subscribe::record::ChangeRecord;
use crate::subscribe::scope::QueryScope;

/// Callback delivering one NOTIFY batch of stale sids to the transport
pub type NotifyFn = Box<dyn Fn(Vec<String>) + Send + Sync>;

/// One live subscription on a connection
struct Subscription {
    /// Interest set: the read records of the subscription's last commit
    interests: Vec<ChangeRecord>,
    paused: bool,
}

pub(crate) struct ConnectionInner {
    notify: NotifyFn,
    subscriptions: Mutex<HashMap<String, Subscription>>,
    stale: Mutex<HashSet<String>>,
}

impl ConnectionInner {
    /// Register (or refresh) the subscription behind a committed query scope
    ///
    /// A re-registration replaces the interest set but keeps the paused flag,
    /// so a refetch of a paused query stays paused.
    pub(crate) fn register(&self, sid: String, interests: Vec<ChangeRecord>) {
        let mut subscriptions = self.subscriptions.lock().unwrap();
        let entry = subscriptions.entry(sid).or_insert_with(|| Subscription {
            interests: Vec::new(),
            paused: false,
        });
        entry.interests = interests;
    }
}

/// Per-connection subscription state with debounced notification delivery
pub struct ConnectionScope {
    cid: String,
    inner: Arc<ConnectionInner>,
    debouncer: Debouncer,
    bus: Arc<dyn EventBus>,
}

impl ConnectionScope {
    /// Create the scope for a newly connected duplex transport
    ///
    /// `notify` is invoked once per flush with the sorted batch of stale
    /// sids; the delay bounds notification frequency for the connection.
    pub fn new(
        cid: impl Into<String>,
        delay: Duration,
        bus: Arc<dyn EventBus>,
        notify: impl Fn(Vec<String>) + Send + Sync + 'static,
    ) -> Arc<Self> {
        let inner = Arc::new(ConnectionInner {
            notify: Box::new(notify),
            subscriptions: Mutex::new(HashMap::new()),
            stale: Mutex::new(HashSet::new()),
        });

        let flush_target = inner.clone();
        let debouncer = Debouncer::new(delay, move || {
            let mut batch = {
                let subscriptions = flush_target.subscriptions.lock().unwrap();
                let mut stale = flush_target.stale.lock().unwrap();
                let mut ready = Vec::new();
                stale.retain(|sid| match subscriptions.get(sid) {
                    // Paused subscriptions stay stale until resumed
                    Some(sub) if sub.paused => true,
                    Some(_) => {
                        ready.push(sid.clone());
                        false
                    }
                    // Unsubscribed in the meantime
                    None => false,
                });
                ready
            };
            if !batch.is_empty() {
                batch.sort();
                (flush_target.notify)(batch);
            }
        });

        Arc::new(Self {
            cid: cid.into(),
            inner,
            debouncer,
            bus,
        })
    }

    pub fn cid(&self) -> &str {
        &self.cid
    }

    /// Open a query scope for one executed query on this connection
    ///
    /// The scope's sid is derived from the query content, so a refetch of
    /// the same query refreshes the same subscription.
    pub fn scope(&self, query: &str, variables: &serde_json::Value) -> Arc<QueryScope> {
        QueryScope::open(
            crate::graph::request::content_id(query, variables),
            self.inner.clone(),
            self.bus.clone(),
        )
    }

    /// Match a broadcast change record against this connection's subscriptions
    ///
    /// Matching sids are marked stale; the flush timer is triggered when any
    /// new sid was marked.
    pub fn apply(&self, record: &ChangeRecord) {
        let matched: Vec<String> = {
            let subscriptions = self.inner.subscriptions.lock().unwrap();
            subscriptions
                .iter()
                .filter(|(_, sub)| sub.interests.iter().any(|i| record.invalidates(i)))
                .map(|(sid, _)| sid.clone())
                .collect()
        };
        if matched.is_empty() {
            return;
        }

        let mut marked = false;
        {
            let mut stale = self.inner.stale.lock().unwrap();
            for sid in matched {
                marked |= stale.insert(sid);
            }
        }
        if marked {
            self.debouncer.trigger();
        }
    }

    /// Pause notification delivery for one subscription
    ///
    /// Staleness keeps accumulating while paused; only the flush skips it.
    pub fn pause(&self, sid: &str) -> bool {
        let mut subscriptions = self.inner.subscriptions.lock().unwrap();
        match subscriptions.get_mut(sid) {
            Some(sub) => {
                sub.paused = true;
                true
            }
            None => false,
        }
    }

    /// Resume notification delivery for one subscription
    pub fn resume(&self, sid: &str) -> bool {
        let known = {
            let mut subscriptions = self.inner.subscriptions.lock().unwrap();
            match subscriptions.get_mut(sid) {
                Some(sub) => {
                    sub.paused = false;
                    true
                }
                None => false,
            }
        };
        if known && self.inner.stale.lock().unwrap().contains(sid) {
            // Deliver what accumulated while paused
            self.debouncer.trigger();
        }
        known
    }

    /// Drop one subscription and any pending staleness for it
    pub fn unsubscribe(&self, sid: &str) -> bool {
        let existed = self.inner.subscriptions.lock().unwrap().remove(sid).is_some();
        self.inner.stale.lock().unwrap().remove(sid);
        existed
    }

    /// Sids of all live subscriptions on this connection
    pub fn subscriptions(&self) -> Vec<String> {
        let mut sids: Vec<String> = self
            .inner
            .subscriptions
            .lock()
            .unwrap()
            .keys()
            .cloned()
            .collect();
        sids.sort();
        sids
    }

    /// Destroy the scope on disconnect
    ///
    /// Stops the flush timer deterministically and discards all
    /// subscriptions and pending staleness.
    pub async fn destroy(&self) {
        self.debouncer.stop().await;
        self.inner.subscriptions.lock().unwrap().clear();
        self.inner.stale.lock().unwrap().clear();
        tracing::debug!("[Subscribe] connection scope destroyed: cid={}", self.cid);
    }
}
