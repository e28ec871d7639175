/**
 * Schema Composer
 *
 * Independently developed feature modules each contribute fragments of one
 * shared schema and resolver set. Composition starts from a minimal root
 * schema (an empty root query/mutation type), merges every module's
 * contributions in registration order, then mixes in the built-in scalars
 * and the server introspection type last, so application fragments may
 * reference the built-ins but not redefine them.
 *
 * A (type, field) resolver binding may be registered at most once; a second
 * registration fails composition with a `DuplicateBinding` error naming the
 * pair. Composition happens once at startup, never per request.
 */

pub mod builtins;
pub mod document;

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::auth::Identity;
use crate::error::ServerError;
use crate::hooks::TxHandle;
use crate::store::SharedStore;
use crate::subscribe::QueryScope;

use document::SchemaDocument;

/// The pseudo-type addressing the schema's top level
///
/// A schema contribution for `root` adds a new top-level block; a resolver
/// contribution for `root` registers a type-level handler such as a scalar
/// coercion.
pub const ROOT_PSEUDO_TYPE: &str = "root";

/// Context handed to every resolver invocation
#[derive(Clone)]
pub struct ResolverContext {
    /// Transaction handle from the wrapper, if a persistence layer is wired
    pub tx: Option<TxHandle>,
    /// Change-tracking scope; absent on non-duplex requests
    pub scope: Option<Arc<QueryScope>>,
    /// Identity resolved by the auth state machine
    pub identity: Identity,
}

/// A resolver function bound to one (type, field) pair
pub type ResolverFn = Arc<
    dyn Fn(ResolverContext, serde_json::Value) -> BoxFuture<'static, Result<serde_json::Value, ServerError>>
        + Send
        + Sync,
>;

/// Wrap an async closure as a resolver function
pub fn resolver<F, Fut>(f: F) -> ResolverFn
where
    F: Fn(ResolverContext, serde_json::Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<serde_json::Value, ServerError>> + Send + 'static,
{
    Arc::new(move |ctx, args| Box::pin(f(ctx, args)))
}

/// One contribution for a (type, field) pair
pub enum Contribution {
    /// Schema text only
    SchemaOnly(String),
    /// Resolver function only
    ResolverOnly(ResolverFn),
    /// Paired schema text and resolver function
    Full(String, ResolverFn),
}

/// A feature module's set of contributions, applied in registration order
pub struct SchemaModule {
    pub name: String,
    contributions: Vec<(String, String, Contribution)>,
}

impl SchemaModule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contributions: Vec::new(),
        }
    }

    /// Add one contribution for `(type_name, field)`
    ///
    /// Use [`ROOT_PSEUDO_TYPE`] to contribute top-level schema blocks or
    /// type-level resolvers.
    pub fn contribute(
        mut self,
        type_name: impl Into<String>,
        field: impl Into<String>,
        contribution: Contribution,
    ) -> Self {
        self.contributions
            .push((type_name.into(), field.into(), contribution));
        self
    }
}

/// The composed schema and resolver map, ready for the execution engine
pub struct ComposedSchema {
    sdl: String,
    resolvers: HashMap<String, HashMap<String, ResolverFn>>,
}

impl ComposedSchema {
    /// The serialized schema text
    pub fn sdl(&self) -> &str {
        &self.sdl
    }

    /// Look up the resolver bound to `(type_name, field)`
    pub fn resolver(&self, type_name: &str, field: &str) -> Option<ResolverFn> {
        self.resolvers.get(type_name)?.get(field).cloned()
    }
}

struct Composer {
    doc: SchemaDocument,
    resolvers: HashMap<String, HashMap<String, ResolverFn>>,
}

impl Composer {
    fn new() -> Self {
        Self {
            doc: SchemaDocument::minimal_root(),
            resolvers: HashMap::from([("Root".to_string(), HashMap::new())]),
        }
    }

    fn mixin_schema(&mut self, type_name: &str, text: &str) -> Result<(), ServerError> {
        if type_name == ROOT_PSEUDO_TYPE {
            self.doc.add_top_level(text)
        } else {
            self.doc.append_to_type(type_name, text)
        }
    }

    fn mixin_resolver(
        &mut self,
        type_name: &str,
        field: &str,
        f: ResolverFn,
    ) -> Result<(), ServerError> {
        let fields = self.resolvers.entry(type_name.to_string()).or_default();
        if fields.contains_key(field) {
            return Err(ServerError::duplicate_binding(type_name, field));
        }
        fields.insert(field.to_string(), f);
        Ok(())
    }

    fn apply(&mut self, module: SchemaModule) -> Result<(), ServerError> {
        tracing::debug!("[Schema] composing module: {}", module.name);
        for (type_name, field, contribution) in module.contributions {
            match contribution {
                Contribution::SchemaOnly(text) => {
                    self.mixin_schema(&type_name, &text)?;
                }
                Contribution::ResolverOnly(f) => {
                    self.mixin_resolver(&type_name, &field, f)?;
                }
                Contribution::Full(text, f) => {
                    self.mixin_schema(&type_name, &text)?;
                    self.mixin_resolver(&type_name, &field, f)?;
                }
            }
        }
        Ok(())
    }

    fn finish(self) -> ComposedSchema {
        ComposedSchema {
            sdl: self.doc.serialize(),
            resolvers: self.resolvers,
        }
    }
}

/// Compose all module contributions plus the built-ins into one schema
///
/// `store` backs the built-in `_server` introspection resolver; `name` and
/// `version` are reported through it.
pub fn compose(
    modules: Vec<SchemaModule>,
    store: Arc<dyn SharedStore>,
    name: &str,
    version: &str,
) -> Result<ComposedSchema, ServerError> {
    let mut composer = Composer::new();
    for module in modules {
        composer.apply(module)?;
    }
    composer.apply(builtins::builtin_module(store, name, version))?;
    let composed = composer.finish();
    tracing::info!(
        "[Schema] composition complete: {} types with resolvers",
        composed.resolvers.len()
    );
    Ok(composed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn store() -> Arc<dyn SharedStore> {
        Arc::new(MemoryStore::new())
    }

    fn null_resolver() -> ResolverFn {
        resolver(|_ctx, _args| async { Ok(serde_json::Value::Null) })
    }

    fn compose_modules(modules: Vec<SchemaModule>) -> Result<ComposedSchema, ServerError> {
        compose(modules, store(), "graphwire", "0.1.0")
    }

    #[test]
    fn test_empty_composition_carries_builtins() {
        let composed = compose_modules(vec![]).unwrap();
        assert!(composed.sdl().contains("scalar JSON"));
        assert!(composed.sdl().contains("scalar UUID"));
        assert!(composed.sdl().contains("scalar Void"));
        assert!(composed.sdl().contains("type Server {"));
        assert!(composed.resolver("Root", "_server").is_some());
    }

    #[test]
    fn test_module_contributions_merge() {
        let module = SchemaModule::new("widgets")
            .contribute(
                ROOT_PSEUDO_TYPE,
                "Widget",
                Contribution::SchemaOnly("type Widget {\n  id: UUID!\n}".to_string()),
            )
            .contribute(
                "Root",
                "widgets",
                Contribution::Full("widgets: [Widget]!".to_string(), null_resolver()),
            );
        let composed = compose_modules(vec![module]).unwrap();
        assert!(composed.sdl().contains("type Widget {"));
        assert!(composed.sdl().contains("widgets: [Widget]!"));
        assert!(composed.resolver("Root", "widgets").is_some());
        assert!(composed.resolver("Root", "ghosts").is_none());
    }

    #[test]
    fn test_duplicate_binding_fails_within_module() {
        let module = SchemaModule::new("widgets")
            .contribute("Root", "widgets", Contribution::ResolverOnly(null_resolver()))
            .contribute("Root", "widgets", Contribution::ResolverOnly(null_resolver()));
        match compose_modules(vec![module]) {
            Err(ServerError::DuplicateBinding { type_name, field }) => {
                assert_eq!(type_name, "Root");
                assert_eq!(field, "widgets");
            }
            other => panic!("expected DuplicateBinding, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_duplicate_binding_fails_across_modules_regardless_of_order() {
        for flip in [false, true] {
            let a = SchemaModule::new("a").contribute(
                "Root",
                "widgets",
                Contribution::ResolverOnly(null_resolver()),
            );
            let b = SchemaModule::new("b").contribute(
                "Root",
                "widgets",
                Contribution::ResolverOnly(null_resolver()),
            );
            let modules = if flip { vec![b, a] } else { vec![a, b] };
            assert!(matches!(
                compose_modules(modules),
                Err(ServerError::DuplicateBinding { .. })
            ));
        }
    }

    #[test]
    fn test_module_may_extend_another_modules_type() {
        let base = SchemaModule::new("base").contribute(
            ROOT_PSEUDO_TYPE,
            "Widget",
            Contribution::SchemaOnly("type Widget {\n  id: UUID!\n}".to_string()),
        );
        let extension = SchemaModule::new("extension").contribute(
            "Widget",
            "name",
            Contribution::Full("name: String".to_string(), null_resolver()),
        );
        let composed = compose_modules(vec![base, extension]).unwrap();
        assert!(composed.sdl().contains("    name: String\n"));
        assert!(composed.resolver("Widget", "name").is_some());
    }

    #[test]
    fn test_fragment_for_unknown_type_fails() {
        let module = SchemaModule::new("broken").contribute(
            "Ghost",
            "name",
            Contribution::SchemaOnly("name: String".to_string()),
        );
        assert!(matches!(
            compose_modules(vec![module]),
            Err(ServerError::Composition { .. })
        ));
    }

    #[test]
    fn test_application_cannot_rebind_builtin_scalar() {
        let module = SchemaModule::new("rogue").contribute(
            ROOT_PSEUDO_TYPE,
            "JSON",
            Contribution::ResolverOnly(null_resolver()),
        );
        // The built-in mixin runs last and collides with the rogue binding
        assert!(matches!(
            compose_modules(vec![module]),
            Err(ServerError::DuplicateBinding { .. })
        ));
    }
}
