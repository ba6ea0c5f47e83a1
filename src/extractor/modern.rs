use crate::config::GeneratorOptions;
use crate::extractor::{resolve_module, HandlerRef, RouteDescriptor, RouteExtractor};
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

static IMPORT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"import\(\s*['"]([^'"]+)['"]\s*\)"#).unwrap());

/// Method called on a lazily imported controller when none is named.
const DEFAULT_ACTION: &str = "handle";

/// Route entry in the newer shape: one handler value and middleware given as
/// named functions or closures.
///
/// ```json
/// {"pattern": "/users", "methods": ["GET"],
///  "handler": {"reference": ["() => import('#controllers/users_controller')", "index"]},
///  "middleware": [{"name": "auth"}, {}]}
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ModernRoute {
    pub pattern: String,
    #[serde(default)]
    pub methods: Vec<String>,
    pub handler: ModernHandler,
    #[serde(default)]
    pub middleware: Vec<MiddlewareEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ModernHandler {
    /// `"UsersController.index"`
    Dotted(String),
    Reference {
        reference: HandlerReference,
        #[serde(default)]
        name: Option<String>,
    },
    Closure {
        #[serde(default)]
        name: Option<String>,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum HandlerReference {
    /// `"#controllers/users_controller.index"`
    Dotted(String),
    /// `[lazyImport, "method"]`
    Lazy(ImportRef, String),
    /// `[lazyImport]`, calls the default action
    LazyDefault([ImportRef; 1]),
}

/// A lazy import, exported either as its source text or as a function object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ImportRef {
    Source(String),
    Function {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        source: Option<String>,
    },
}

impl ImportRef {
    /// The module specifier from the `import('...')` text, else the function name.
    fn module_specifier(&self) -> Option<String> {
        match self {
            ImportRef::Source(text) => import_target(text).or_else(|| {
                let looks_like_code = text.contains("=>") || text.contains('(');
                (!looks_like_code && !text.trim().is_empty()).then(|| text.trim().to_string())
            }),
            ImportRef::Function { name, source } => source
                .as_deref()
                .and_then(import_target)
                .or_else(|| name.clone().filter(|name| !name.is_empty())),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MiddlewareEntry {
    Name(String),
    Named {
        #[serde(default)]
        name: Option<String>,
    },
    Other(Value),
}

impl MiddlewareEntry {
    fn name(&self) -> String {
        match self {
            MiddlewareEntry::Name(name) => name.clone(),
            MiddlewareEntry::Named { name: Some(name) } if !name.is_empty() => name.clone(),
            _ => "closure".to_string(),
        }
    }
}

impl RouteExtractor for ModernRoute {
    fn extract_route(&self, options: &GeneratorOptions) -> Option<RouteDescriptor> {
        if self.methods.is_empty() {
            warn!("Route {} declares no methods, skipping", self.pattern);
            return None;
        }

        let handler = self.resolve_handler(options);
        debug!("Modern route {} handled by {:?}", self.pattern, handler);

        let middleware = self.middleware.iter().map(MiddlewareEntry::name).collect();
        Some(RouteDescriptor::new(
            &self.pattern,
            &self.methods,
            middleware,
            handler,
            options.tag_index,
        ))
    }
}

impl ModernRoute {
    fn resolve_handler(&self, options: &GeneratorOptions) -> HandlerRef {
        match &self.handler {
            ModernHandler::Dotted(reference)
            | ModernHandler::Reference {
                reference: HandlerReference::Dotted(reference),
                ..
            } => dotted_handler(reference, options),
            ModernHandler::Reference {
                reference: HandlerReference::Lazy(import, action),
                ..
            } => lazy_handler(import, action, options),
            ModernHandler::Reference {
                reference: HandlerReference::LazyDefault([import]),
                ..
            } => lazy_handler(import, DEFAULT_ACTION, options),
            ModernHandler::Closure { name } => HandlerRef::Closure {
                name: name
                    .clone()
                    .filter(|name| !name.is_empty())
                    .unwrap_or_else(|| "closure".to_string()),
            },
        }
    }
}

/// `module.action`, split at the last dot.
fn dotted_handler(reference: &str, options: &GeneratorOptions) -> HandlerRef {
    let (module, action) = match reference.rsplit_once('.') {
        Some((module, action)) if !action.contains('/') => (module, action),
        _ => (reference, DEFAULT_ACTION),
    };
    HandlerRef::Controller {
        source_file: controller_path(module, options),
        action: action.to_string(),
    }
}

fn lazy_handler(import: &ImportRef, action: &str, options: &GeneratorOptions) -> HandlerRef {
    match import.module_specifier() {
        Some(module) => HandlerRef::Controller {
            source_file: controller_path(&module, options),
            action: action.to_string(),
        },
        None => {
            warn!("Cannot recover the module of lazy handler {:?}", import);
            HandlerRef::closure()
        }
    }
}

/// Bare controller names live in the controllers directory.
fn controller_path(module: &str, options: &GeneratorOptions) -> String {
    let resolved = resolve_module(module, options);
    if resolved.contains('/') {
        return resolved;
    }
    match options.import_aliases.get("#controllers") {
        Some(dir) => format!("{}/{}", dir.trim_end_matches('/'), resolved),
        None => resolved,
    }
}

fn import_target(text: &str) -> Option<String> {
    IMPORT_REGEX
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|target| target.as_str().to_string())
}
