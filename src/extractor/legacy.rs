use crate::config::GeneratorOptions;
use crate::extractor::{HandlerRef, RouteDescriptor, RouteExtractor};
use log::{debug, warn};
use serde::Deserialize;

/// Route entry in the older shape: the framework has already resolved the
/// handler into a namespace and a method, middleware are plain names.
///
/// ```json
/// {"pattern": "/users/:id", "methods": ["GET", "HEAD"], "middleware": ["auth"],
///  "meta": {"resolvedHandler": {"type": "controller",
///           "namespace": "App/Controllers/Http/UsersController", "method": "show"}}}
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyRoute {
    pub pattern: String,
    #[serde(default)]
    pub methods: Vec<String>,
    pub meta: LegacyMeta,
    #[serde(default)]
    pub middleware: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyMeta {
    pub resolved_handler: ResolvedHandler,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResolvedHandler {
    /// `controller` or `function`
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
}

impl RouteExtractor for LegacyRoute {
    fn extract_route(&self, options: &GeneratorOptions) -> Option<RouteDescriptor> {
        if self.methods.is_empty() {
            warn!("Route {} declares no methods, skipping", self.pattern);
            return None;
        }

        let handler = self.resolve_handler();
        debug!("Legacy route {} handled by {:?}", self.pattern, handler);

        Some(RouteDescriptor::new(
            &self.pattern,
            &self.methods,
            self.middleware.clone(),
            handler,
            options.tag_index,
        ))
    }
}

impl LegacyRoute {
    fn resolve_handler(&self) -> HandlerRef {
        let resolved = &self.meta.resolved_handler;
        match (resolved.kind.as_str(), &resolved.namespace, &resolved.method) {
            ("controller", Some(namespace), Some(method)) => HandlerRef::Controller {
                source_file: namespace_to_path(namespace),
                action: method.clone(),
            },
            _ => HandlerRef::closure(),
        }
    }
}

/// `App/Controllers/Http/UsersController` lives under `app/`.
fn namespace_to_path(namespace: &str) -> String {
    match namespace.strip_prefix("App/") {
        Some(rest) => format!("app/{}", rest),
        None => namespace.to_string(),
    }
}
