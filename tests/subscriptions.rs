//! Cross-component tests for the subscription engine: notification
//! delivery through the full bus/dispatch path, set-dedup within a debounce
//! window, rejection semantics, and shared-store client accounting across
//! two modeled worker processes.

mod common;

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio::time::timeout;

use graphwire::auth::Identity;
use graphwire::graph::pipeline;
use graphwire::hooks::HookRegistry;
use graphwire::server::init::build;
use graphwire::store::{BusEvent, EventBus, MemoryBus, MemoryStore, SharedStore};
use graphwire::subscribe::{AggregateStats, SERVER_KEY};

use common::{server, test_config, widget_module};

async fn next_batch(rx: &mut mpsc::UnboundedReceiver<Vec<String>>) -> Vec<String> {
    timeout(Duration::from_millis(500), rx.recv())
        .await
        .expect("notification expected")
        .unwrap()
}

async fn assert_quiet(rx: &mut mpsc::UnboundedReceiver<Vec<String>>) {
    assert!(timeout(Duration::from_millis(150), rx.recv()).await.is_err());
}

#[tokio::test]
async fn test_subscriber_notified_once_per_debounce_window() {
    let (_server, state, _handle) = server().await;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let subscriber = state
        .subscriptions
        .connect("subscriber", move |sids| {
            let _ = tx.send(sids);
        })
        .await;
    let updater = state.subscriptions.connect("updater", |_| {}).await;

    // Subscribe to Widget#42 by executing the reading query
    pipeline::run(
        &state,
        json!({"query": "{ widget }"}),
        Identity::default(),
        Some(&subscriber),
    )
    .await
    .unwrap();

    // Two updates within one debounce window collapse to one notification
    for _ in 0..2 {
        pipeline::run(
            &state,
            json!({"query": "{ setWidget }"}),
            Identity::default(),
            Some(&updater),
        )
        .await
        .unwrap();
    }

    let batch = next_batch(&mut rx).await;
    assert_eq!(batch.len(), 1);
    assert_eq!(batch[0], subscriber.subscriptions()[0]);
    assert_quiet(&mut rx).await;
}

#[tokio::test]
async fn test_rejected_scope_triggers_no_notification() {
    let (_server, state, _handle) = server().await;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let subscriber = state
        .subscriptions
        .connect("subscriber", move |sids| {
            let _ = tx.send(sids);
        })
        .await;
    let updater = state.subscriptions.connect("updater", |_| {}).await;

    pipeline::run(
        &state,
        json!({"query": "{ widget }"}),
        Identity::default(),
        Some(&subscriber),
    )
    .await
    .unwrap();

    // The failing mutation records an update, but its scope is rejected
    let envelope = pipeline::run(
        &state,
        json!({"query": "{ breakWidget }"}),
        Identity::default(),
        Some(&updater),
    )
    .await
    .unwrap();
    assert_eq!(envelope["errors"][0]["message"], "widget broke");

    assert_quiet(&mut rx).await;
}

#[tokio::test]
async fn test_plain_http_update_is_untracked() {
    let (_server, state, _handle) = server().await;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let subscriber = state
        .subscriptions
        .connect("subscriber", move |sids| {
            let _ = tx.send(sids);
        })
        .await;

    pipeline::run(
        &state,
        json!({"query": "{ widget }"}),
        Identity::default(),
        Some(&subscriber),
    )
    .await
    .unwrap();

    // No connection scope: the update executes but is not tracked
    pipeline::run(
        &state,
        json!({"query": "{ setWidget }"}),
        Identity::default(),
        None,
    )
    .await
    .unwrap();

    assert_quiet(&mut rx).await;
}

async fn two_processes() -> (
    graphwire::server::state::AppState,
    graphwire::server::state::AppState,
    graphwire::server::init::ServerHandle,
    graphwire::server::init::ServerHandle,
) {
    // Two builds over one store/bus model two workers; one is the leader
    let shared_store = MemoryStore::new();
    let shared_bus = MemoryBus::new();

    let leader = test_config();
    let mut follower = test_config();
    follower.is_leader = false;

    let (_r1, p1, h1) = build(
        leader,
        HookRegistry::new(),
        vec![widget_module()],
        Arc::new(shared_store.clone()),
        Arc::new(shared_bus.clone()),
        Arc::new(graphwire::graph::DispatchEngine),
    )
    .await
    .unwrap();
    let (_r2, p2, h2) = build(
        follower,
        HookRegistry::new(),
        vec![widget_module()],
        Arc::new(shared_store),
        Arc::new(shared_bus),
        Arc::new(graphwire::graph::DispatchEngine),
    )
    .await
    .unwrap();
    (p1, p2, h1, h2)
}

async fn clients_of(store: &Arc<dyn SharedStore>) -> i64 {
    let stats: AggregateStats =
        serde_json::from_value(store.get(SERVER_KEY).await.unwrap().unwrap()).unwrap();
    stats.clients
}

#[tokio::test]
async fn test_client_delta_applied_exactly_once_across_processes() {
    let (p1, p2, h1, h2) = two_processes().await;

    // A connection on the follower publishes its delta on the shared bus
    p2.subscriptions.connect("c1", |_| {}).await;
    tokio::time::sleep(Duration::from_millis(200)).await;

    // Both processes read the same shared record: incremented exactly once
    assert_eq!(clients_of(&p1.store).await, 1);
    assert_eq!(clients_of(&p2.store).await, 1);

    p2.subscriptions.disconnect("c1").await;
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(clients_of(&p1.store).await, 0);

    h1.shutdown().await;
    h2.shutdown().await;
}

#[tokio::test]
async fn test_change_records_fan_out_across_processes() {
    let (p1, p2, h1, h2) = two_processes().await;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let subscriber = p1
        .subscriptions
        .connect("p1-subscriber", move |sids| {
            let _ = tx.send(sids);
        })
        .await;
    let updater = p2.subscriptions.connect("p2-updater", |_| {}).await;

    pipeline::run(
        &p1,
        json!({"query": "{ widget }"}),
        Identity::default(),
        Some(&subscriber),
    )
    .await
    .unwrap();

    // The update committed in process 2 reaches the subscriber in process 1
    pipeline::run(
        &p2,
        json!({"query": "{ setWidget }"}),
        Identity::default(),
        Some(&updater),
    )
    .await
    .unwrap();

    assert_eq!(next_batch(&mut rx).await.len(), 1);

    h1.shutdown().await;
    h2.shutdown().await;
}

#[tokio::test]
async fn test_bus_delta_from_raw_publish_converges() {
    let (p1, _p2, h1, h2) = two_processes().await;

    p1.bus.publish(BusEvent::ClientDelta(1)).await.unwrap();
    p1.bus.publish(BusEvent::ClientDelta(1)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    let value: Value = p1.store.get(SERVER_KEY).await.unwrap().unwrap();
    assert_eq!(value["clients"], 2);

    h1.shutdown().await;
    h2.shutdown().await;
}
