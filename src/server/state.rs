/**
 * Application State
 *
 * The central state container handed to every handler. Everything in it is
 * constructed once at startup: the configuration, the collaborator
 * registry, the composed schema, the execution engine, the shared store and
 * bus seams, the subscription engine and the request meter.
 *
 * `FromRef` implementations let handlers extract the parts they need
 * without taking the whole state, following axum's state pattern.
 */

use std::sync::Arc;

use axum::extract::FromRef;

use crate::graph::engine::ExecutionEngine;
use crate::hooks::HookRegistry;
use crate::schema::ComposedSchema;
use crate::server::config::ServerConfig;
use crate::store::{EventBus, SharedStore};
use crate::subscribe::{RequestMeter, SubscriptionEngine};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub hooks: HookRegistry,
    pub schema: Arc<ComposedSchema>,
    pub engine: Arc<dyn ExecutionEngine>,
    pub store: Arc<dyn SharedStore>,
    pub bus: Arc<dyn EventBus>,
    pub subscriptions: Arc<SubscriptionEngine>,
    pub meter: Arc<RequestMeter>,
}

impl FromRef<AppState> for Arc<ServerConfig> {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for HookRegistry {
    fn from_ref(state: &AppState) -> Self {
        state.hooks.clone()
    }
}

impl FromRef<AppState> for Arc<SubscriptionEngine> {
    fn from_ref(state: &AppState) -> Self {
        state.subscriptions.clone()
    }
}

#[cfg(test)]
pub mod test_support {
    use super::*;
    use crate::graph::engine::DispatchEngine;
    use crate::schema::{compose, SchemaModule};
    use crate::store::{MemoryBus, MemoryStore};
    use std::time::Duration;

    /// A single-process state over memory store/bus with the given modules
    pub async fn state_with_modules(modules: Vec<SchemaModule>) -> AppState {
        let config = Arc::new(ServerConfig::default());
        let store: Arc<dyn SharedStore> = Arc::new(MemoryStore::new());
        let bus: Arc<dyn EventBus> = Arc::new(MemoryBus::new());
        let schema = Arc::new(
            compose(modules, store.clone(), &config.name, &config.version)
                .expect("test schema composes"),
        );
        AppState {
            config,
            hooks: HookRegistry::new(),
            schema,
            engine: Arc::new(DispatchEngine),
            store,
            bus: bus.clone(),
            subscriptions: SubscriptionEngine::new(bus, Duration::from_millis(20)),
            meter: Arc::new(RequestMeter::new()),
        }
    }

    /// A state with no application modules
    pub async fn minimal_state() -> AppState {
        state_with_modules(Vec::new()).await
    }
}
