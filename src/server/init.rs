/**
 * Server Initialization
 *
 * Startup composes the schema once, seeds the shared aggregate record,
 * wires the subscription engine, spawns the bus dispatch task and (in the
 * leader process) the stats sampler, and assembles the router.
 *
 * The returned `ServerHandle` owns every background task and timer; calling
 * `shutdown` stops them deterministically, so no orphaned timer outlives
 * the server.
 */

use std::sync::Arc;

use axum::Router;
use tokio::task::JoinHandle;

use crate::error::ServerError;
use crate::graph::engine::{DispatchEngine, ExecutionEngine};
use crate::hooks::HookRegistry;
use crate::routes::router::create_router;
use crate::schema::{compose, SchemaModule};
use crate::server::config::ServerConfig;
use crate::server::state::AppState;
use crate::store::{BusEvent, EventBus, MemoryBus, MemoryStore, SharedStore};
use crate::subscribe::{AggregateStats, ClientCounter, RequestMeter, StatsSampler, SubscriptionEngine, SERVER_KEY};

/// Handle over the server's background tasks and timers
pub struct ServerHandle {
    dispatch: JoinHandle<()>,
    sampler: Arc<StatsSampler>,
    counter: Arc<ClientCounter>,
    subscriptions: Arc<SubscriptionEngine>,
}

impl ServerHandle {
    /// Stop every background task and timer deterministically
    pub async fn shutdown(self) {
        self.sampler.stop().await;
        self.counter.stop().await;
        self.dispatch.abort();
        let _ = self.dispatch.await;
        self.subscriptions.shutdown().await;
        tracing::info!("[Server] background tasks stopped");
    }
}

/// Create the application with the in-process store/bus and the bundled
/// dispatch engine
///
/// The convenient entry point for a single-process deployment; multi-worker
/// deployments use [`build`] with a cross-process store/bus.
pub async fn create_app(
    config: ServerConfig,
    hooks: HookRegistry,
    modules: Vec<SchemaModule>,
) -> Result<(Router, AppState, ServerHandle), ServerError> {
    build(
        config,
        hooks,
        modules,
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryBus::new()),
        Arc::new(DispatchEngine),
    )
    .await
}

/// Create the application over explicit store, bus and engine seams
pub async fn build(
    config: ServerConfig,
    hooks: HookRegistry,
    modules: Vec<SchemaModule>,
    store: Arc<dyn SharedStore>,
    bus: Arc<dyn EventBus>,
    engine: Arc<dyn ExecutionEngine>,
) -> Result<(Router, AppState, ServerHandle), ServerError> {
    tracing::info!("[Server] initializing {} v{}", config.name, config.version);
    let config = Arc::new(config);

    // Step 1: compose the schema once; composition failures abort startup
    let schema = Arc::new(compose(
        modules,
        store.clone(),
        &config.name,
        &config.version,
    )?);

    // Step 2: seed the shared aggregate record under the store lock
    seed_stats(&store, &config).await?;

    // Step 3: wire the subscription engine and stats components
    let meter = Arc::new(RequestMeter::new());
    let subscriptions = SubscriptionEngine::new(bus.clone(), config.notify_delay);
    let counter = ClientCounter::new(
        store.clone(),
        bus.clone(),
        config.name.clone(),
        config.version.clone(),
        config.client_delta_delay,
    );
    let sampler = StatsSampler::new(
        store.clone(),
        bus.clone(),
        meter.clone(),
        config.name.clone(),
        config.version.clone(),
        config.stats_interval,
        config.is_leader,
    );

    // Step 4: one dispatch task routes bus events to their consumers
    let dispatch = spawn_dispatch(
        bus.clone(),
        subscriptions.clone(),
        counter.clone(),
        config.is_leader,
    );
    sampler.start();

    // Step 5: assemble state and router
    let state = AppState {
        config,
        hooks,
        schema,
        engine,
        store,
        bus,
        subscriptions: subscriptions.clone(),
        meter,
    };
    let router = create_router(state.clone());

    let handle = ServerHandle {
        dispatch,
        sampler,
        counter,
        subscriptions,
    };
    tracing::info!("[Server] router configured");
    Ok((router, state, handle))
}

async fn seed_stats(store: &Arc<dyn SharedStore>, config: &ServerConfig) -> Result<(), ServerError> {
    let seed = |e| ServerError::internal(format!("failed to seed aggregate stats: {e}"));
    store.acquire().await.map_err(seed)?;
    let result = async {
        if store.get(SERVER_KEY).await?.is_none() {
            let stats = AggregateStats::new(&config.name, &config.version);
            store
                .put(SERVER_KEY, serde_json::to_value(&stats).unwrap_or_default())
                .await?;
        }
        Ok(())
    }
    .await;
    store.release().await.map_err(seed)?;
    result.map_err(seed)
}

fn spawn_dispatch(
    bus: Arc<dyn EventBus>,
    subscriptions: Arc<SubscriptionEngine>,
    counter: Arc<ClientCounter>,
    is_leader: bool,
) -> JoinHandle<()> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(BusEvent::Change(record)) => subscriptions.apply_change(&record),
                // Every process sees every delta; only the leader merges
                // them into the shared record
                Ok(BusEvent::ClientDelta(delta)) => {
                    if is_leader {
                        counter.add(delta);
                    }
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::warn!("[Server] bus dispatch lagged, {missed} events dropped");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}
