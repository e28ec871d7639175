/**
 * Execution Engine Seam
 *
 * The pipeline treats query parsing and execution as a black box behind the
 * `ExecutionEngine` trait: it hands over the composed schema, the validated
 * request and a resolver context, and gets back a result value or an
 * execution error.
 *
 * `DispatchEngine` is the bundled minimal engine: it resolves a single root
 * field per request and passes the request variables as the field's
 * arguments. It exists so the server and its tests run end to end;
 * embedders with full query-language needs supply their own engine behind
 * the same trait.
 */

use async_trait::async_trait;

use crate::error::ServerError;
use crate::graph::request::GraphRequest;
use crate::schema::{ComposedSchema, ResolverContext};

/// Black-box query executor
#[async_trait]
pub trait ExecutionEngine: Send + Sync {
    async fn execute(
        &self,
        schema: &ComposedSchema,
        request: &GraphRequest,
        ctx: ResolverContext,
    ) -> Result<serde_json::Value, ServerError>;
}

/// Minimal root-field dispatcher
pub struct DispatchEngine;

/// Extract the first selected root field from a query string
fn root_field(query: &str) -> Option<String> {
    let mut rest = query.trim();
    for keyword in ["query", "mutation"] {
        if let Some(stripped) = rest.strip_prefix(keyword) {
            if stripped.starts_with(|c: char| c.is_whitespace() || c == '{') {
                rest = stripped.trim_start();
            }
        }
    }
    if let Some(open) = rest.find('{') {
        rest = &rest[open + 1..];
    }
    let field: String = rest
        .trim_start()
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .collect();
    (!field.is_empty()).then_some(field)
}

#[async_trait]
impl ExecutionEngine for DispatchEngine {
    async fn execute(
        &self,
        schema: &ComposedSchema,
        request: &GraphRequest,
        ctx: ResolverContext,
    ) -> Result<serde_json::Value, ServerError> {
        let field = root_field(&request.query).ok_or_else(|| {
            ServerError::execution(vec!["query does not select a root field".to_string()])
        })?;
        let resolver = schema.resolver("Root", &field).ok_or_else(|| {
            ServerError::execution(vec![format!("cannot query field '{field}' on type 'Root'")])
        })?;

        let value = resolver(ctx, request.variables.clone()).await?;
        let mut data = serde_json::Map::new();
        data.insert(field, value);
        Ok(serde_json::json!({ "data": data }))
    }
}
