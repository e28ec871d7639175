/**
 * Query Scope
 *
 * One scope per executed query on a duplex connection. Resolvers record
 * every entity they read or mutate; nothing becomes visible until the scope
 * is finalized. Exactly one of `commit` / `reject` is invoked per scope:
 *
 * - `commit` registers the read records as the subscription's interest set
 *   on the parent connection and broadcasts the update records on the
 *   cross-process bus
 * - `reject` discards everything, so a failed query never triggers spurious
 *   notifications
 *
 * A scope that recorded nothing commits as a no-op.
 */

use std::sync::{Arc, Mutex};

use crate::store::{BusEvent, EventBus};
use crate::subscribe::connection::ConnectionInner;
use crate::subscribe::record::{ChangeRecord, Operation};

#[derive(Clone, Copy, Debug, PartialEq)]
enum ScopeState {
    Open,
    Committed,
    Rejected,
}

/// Change accumulator for one executed query
pub struct QueryScope {
    sid: String,
    records: Mutex<Vec<ChangeRecord>>,
    state: Mutex<ScopeState>,
    connection: Arc<ConnectionInner>,
    bus: Arc<dyn EventBus>,
}

impl QueryScope {
    pub(crate) fn open(
        sid: String,
        connection: Arc<ConnectionInner>,
        bus: Arc<dyn EventBus>,
    ) -> Arc<Self> {
        Arc::new(Self {
            sid,
            records: Mutex::new(Vec::new()),
            state: Mutex::new(ScopeState::Open),
            connection,
            bus,
        })
    }

    /// Subscription id of this scope, stable for the same query content
    pub fn sid(&self) -> &str {
        &self.sid
    }

    /// Record one entity access; resolvers call this for every read/update
    pub fn record(&self, record: ChangeRecord) {
        if *self.state.lock().unwrap() != ScopeState::Open {
            tracing::warn!("[Subscribe] record on finalized scope ignored: sid={}", self.sid);
            return;
        }
        self.records.lock().unwrap().push(record);
    }

    fn finalize(&self, target: ScopeState) -> bool {
        let mut state = self.state.lock().unwrap();
        if *state != ScopeState::Open {
            tracing::warn!(
                "[Subscribe] scope already finalized: sid={}, state={:?}",
                self.sid,
                *state
            );
            return false;
        }
        *state = target;
        true
    }

    /// Make the recorded changes visible
    ///
    /// Read records become the subscription's interest set; update records
    /// are broadcast to every process. Publish failures lose notifications,
    /// not query results, and are logged as such.
    pub async fn commit(&self) {
        if !self.finalize(ScopeState::Committed) {
            return;
        }
        let records = std::mem::take(&mut *self.records.lock().unwrap());

        let (reads, updates): (Vec<ChangeRecord>, Vec<ChangeRecord>) = records
            .into_iter()
            .partition(|r| r.op == Operation::Read);

        if !reads.is_empty() {
            self.connection.register(self.sid.clone(), reads);
        }
        for update in updates {
            if let Err(e) = self.bus.publish(BusEvent::Change(update)).await {
                tracing::warn!("[Subscribe] change broadcast failed: sid={}, {e}", self.sid);
            }
        }
    }

    /// Discard the recorded changes
    pub fn reject(&self) {
        if !self.finalize(ScopeState::Rejected) {
            return;
        }
        self.records.lock().unwrap().clear();
    }
}
