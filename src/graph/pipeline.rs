/**
 * Query Execution Pipeline
 *
 * Per-request orchestration: payload validation, scope acquisition,
 * transaction wrapping, the engine call, scope finalization and envelope
 * shaping.
 *
 * The transaction wrapper from the registry is ALWAYS invoked, with or
 * without a persistence layer behind it, so this call site never
 * special-cases. Exactly one of commit/reject is applied to the scope:
 * commit on engine success, reject on any failure, which is what keeps
 * partially-applied work from triggering spurious notifications.
 *
 * Execution-time failures leave here as an `{errors: [{message}]}` envelope
 * with transport success; only structural `BadRequest` propagates as an
 * error to the transport layer.
 */

use std::sync::Arc;
use std::time::Instant;

use futures_util::FutureExt;

use crate::auth::Identity;
use crate::error::ServerError;
use crate::graph::request::GraphRequest;
use crate::hooks::TxWork;
use crate::schema::ResolverContext;
use crate::server::state::AppState;
use crate::subscribe::ConnectionScope;

/// Run one query through the pipeline
///
/// `connection` is the caller's connection scope on a duplex transport;
/// `None` for plain HTTP requests, whose reads and writes still execute but
/// are not tracked for notification.
pub async fn run(
    state: &AppState,
    payload: serde_json::Value,
    identity: Identity,
    connection: Option<&Arc<ConnectionScope>>,
) -> Result<serde_json::Value, ServerError> {
    let request = GraphRequest::parse(payload)?;
    let qid = request.query_id();
    state.meter.tick();

    let scope = connection.map(|conn| conn.scope(&request.query, &request.variables));
    let started = Instant::now();

    let schema = state.schema.clone();
    let engine = state.engine.clone();
    let work_scope = scope.clone();
    let work_request = request.clone();
    let work: TxWork = Box::new(move |tx| {
        async move {
            let ctx = ResolverContext {
                tx,
                scope: work_scope,
                identity,
            };
            engine.execute(&schema, &work_request, ctx).await
        }
        .boxed()
    });

    match state.hooks.transaction.run(work).await {
        Ok(result) => {
            if let Some(scope) = &scope {
                scope.commit().await;
            }
            tracing::info!(
                "[Graph] query ok: qid={}, took={}ms",
                &qid[..8],
                started.elapsed().as_millis()
            );
            Ok(state.hooks.results.process_success(result))
        }
        Err(error) => {
            if let Some(scope) = &scope {
                scope.reject();
            }
            tracing::info!(
                "[Graph] query failed: qid={}, took={}ms, error={error}",
                &qid[..8],
                started.elapsed().as_millis()
            );
            Ok(state.hooks.results.process_error(error.messages()))
        }
    }
}
