/**
 * Built-in Schema Contributions
 *
 * The scalars (JSON, UUID, Void) and the server introspection type are
 * mixed into every composed schema after the application fragments, so
 * applications can reference them but a rebinding attempt collides during
 * composition.
 *
 * The `_server` resolver reads the cluster aggregate record from the shared
 * store without taking its lock; the gauges are approximate by design. On a
 * duplex connection it records a read of the server record, which is what
 * lets clients subscribe to load/clients changes.
 */

use std::sync::Arc;

use uuid::Uuid;

use crate::error::ServerError;
use crate::schema::{resolver, Contribution, SchemaModule, ROOT_PSEUDO_TYPE};
use crate::store::SharedStore;
use crate::subscribe::record::ChangeRecord;
use crate::subscribe::stats::{AggregateStats, SERVER_KEY};

const SERVER_TYPE: &str = "type Server {
  name: String!
  version: String!
  clients: Int!
  requests: [Float]!
  load: [Float]!
}";

pub(crate) fn builtin_module(
    store: Arc<dyn SharedStore>,
    name: &str,
    version: &str,
) -> SchemaModule {
    let server_name = name.to_string();
    let server_version = version.to_string();

    SchemaModule::new("builtin")
        .contribute(
            ROOT_PSEUDO_TYPE,
            "JSON",
            Contribution::Full(
                "scalar JSON".to_string(),
                resolver(|_ctx, value| async move { Ok(value) }),
            ),
        )
        .contribute(
            ROOT_PSEUDO_TYPE,
            "UUID",
            Contribution::Full(
                "scalar UUID".to_string(),
                resolver(|_ctx, value| async move {
                    let text = value.as_str().ok_or_else(|| {
                        ServerError::execution(vec!["UUID value must be a string".to_string()])
                    })?;
                    Uuid::parse_str(text).map_err(|e| {
                        ServerError::execution(vec![format!("invalid UUID value: {e}")])
                    })?;
                    Ok(value)
                }),
            ),
        )
        .contribute(
            ROOT_PSEUDO_TYPE,
            "Void",
            Contribution::Full(
                "scalar Void".to_string(),
                resolver(|_ctx, _value| async { Ok(serde_json::Value::Null) }),
            ),
        )
        .contribute(
            ROOT_PSEUDO_TYPE,
            "Server",
            Contribution::SchemaOnly(SERVER_TYPE.to_string()),
        )
        .contribute(
            "Root",
            "_server",
            Contribution::Full(
                "_server: Server".to_string(),
                resolver(move |ctx, _args| {
                    let store = store.clone();
                    let name = server_name.clone();
                    let version = server_version.clone();
                    async move {
                        if let Some(scope) = &ctx.scope {
                            scope.record(ChangeRecord::read_one("Server", "server"));
                        }
                        // Lock-free read; a slightly stale gauge is fine
                        let stats = match store.get(SERVER_KEY).await {
                            Ok(Some(value)) => serde_json::from_value(value)
                                .unwrap_or_else(|_| AggregateStats::new(&name, &version)),
                            Ok(None) => AggregateStats::new(&name, &version),
                            Err(e) => {
                                return Err(ServerError::internal(format!(
                                    "aggregate stats unavailable: {e}"
                                )))
                            }
                        };
                        serde_json::to_value(&stats).map_err(ServerError::from)
                    }
                }),
            ),
        )
}
