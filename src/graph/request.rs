/**
 * Query Request Payload
 *
 * Structural validation of the `{query, variables?, operationName?}`
 * payload, performed before any auth or execution work. `variables` may
 * arrive as an object or as a JSON-encoded string of one (GraphiQL sends
 * the latter); `operationName` must be a string or absent.
 *
 * The content-derived query id is a hash over the canonicalized
 * (query, variables) pair, used only for tracing correlation, never for
 * caching or result dedup.
 */

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::ServerError;

/// Validated query request
#[derive(Clone, Debug)]
pub struct GraphRequest {
    pub query: String,
    /// Always an object after validation
    pub variables: Value,
    pub operation_name: Option<String>,
}

impl GraphRequest {
    /// Validate a raw payload into a request
    pub fn parse(payload: Value) -> Result<Self, ServerError> {
        let Value::Object(mut map) = payload else {
            return Err(ServerError::bad_request("request payload must be an object"));
        };

        let query = match map.remove("query") {
            Some(Value::String(query)) => query,
            _ => return Err(ServerError::bad_request("query must be a string")),
        };

        let variables = match map.remove("variables") {
            None | Some(Value::Null) => Value::Object(Default::default()),
            Some(Value::Object(vars)) => Value::Object(vars),
            Some(Value::String(encoded)) => {
                let decoded: Value = serde_json::from_str(&encoded)
                    .map_err(|_| ServerError::bad_request("variables is not valid JSON"))?;
                if !decoded.is_object() {
                    return Err(ServerError::bad_request(
                        "variables must decode to an object",
                    ));
                }
                decoded
            }
            Some(_) => return Err(ServerError::bad_request("variables must be an object")),
        };

        let operation_name = match map.remove("operationName") {
            None | Some(Value::Null) => None,
            Some(Value::String(name)) => Some(name),
            Some(_) => return Err(ServerError::bad_request("operationName must be a string")),
        };

        Ok(Self {
            query,
            variables,
            operation_name,
        })
    }

    /// Content-derived id for tracing/log correlation
    pub fn query_id(&self) -> String {
        content_id(&self.query, &self.variables)
    }
}

/// Hash the canonicalized (query, variables) pair
///
/// Object keys serialize in sorted order, so the same content always hashes
/// to the same id.
pub fn content_id(query: &str, variables: &Value) -> String {
    let canonical = serde_json::json!({ "query": query, "variables": variables });
    let mut hasher = Sha256::new();
    hasher.update(canonical.to_string().as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    #[test]
    fn test_minimal_payload() {
        let request = GraphRequest::parse(json!({"query": "{ _server }"})).unwrap();
        assert_eq!(request.query, "{ _server }");
        assert_eq!(request.variables, json!({}));
        assert_eq!(request.operation_name, None);
    }

    #[test]
    fn test_variables_as_object() {
        let request =
            GraphRequest::parse(json!({"query": "q", "variables": {"id": "42"}})).unwrap();
        assert_eq!(request.variables, json!({"id": "42"}));
    }

    #[test]
    fn test_variables_as_encoded_string() {
        let request =
            GraphRequest::parse(json!({"query": "q", "variables": "{\"id\": \"42\"}"})).unwrap();
        assert_eq!(request.variables, json!({"id": "42"}));
    }

    #[test]
    fn test_missing_query_is_bad_request() {
        assert_matches!(
            GraphRequest::parse(json!({"variables": {}})),
            Err(ServerError::BadRequest { .. })
        );
    }

    #[test]
    fn test_non_string_query_is_bad_request() {
        assert_matches!(
            GraphRequest::parse(json!({"query": 42})),
            Err(ServerError::BadRequest { .. })
        );
    }

    #[test]
    fn test_array_variables_is_bad_request() {
        assert_matches!(
            GraphRequest::parse(json!({"query": "q", "variables": [1, 2]})),
            Err(ServerError::BadRequest { .. })
        );
    }

    #[test]
    fn test_encoded_variables_must_be_object() {
        assert_matches!(
            GraphRequest::parse(json!({"query": "q", "variables": "[1, 2]"})),
            Err(ServerError::BadRequest { .. })
        );
    }

    #[test]
    fn test_object_operation_name_is_bad_request() {
        assert_matches!(
            GraphRequest::parse(json!({"query": "q", "operationName": {}})),
            Err(ServerError::BadRequest { .. })
        );
    }

    #[test]
    fn test_query_id_is_content_stable() {
        let a = GraphRequest::parse(json!({"query": "q", "variables": {"a": 1, "b": 2}})).unwrap();
        let b = GraphRequest::parse(json!({"query": "q", "variables": {"b": 2, "a": 1}})).unwrap();
        assert_eq!(a.query_id(), b.query_id());

        let c = GraphRequest::parse(json!({"query": "q", "variables": {"a": 2}})).unwrap();
        assert_ne!(a.query_id(), c.query_id());
    }
}
