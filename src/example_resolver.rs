//! Schema example resolution.
//!
//! Expands a schema name into a concrete example payload by walking the
//! schema graph held by the [`SchemaRegistry`]. Which parts of the graph are
//! walked is controlled by a [`FilterSpec`] parsed from annotation tokens:
//!
//! - `with(a,b.c)` includes relations (`relations` includes every top-level one,
//!   `a.relations` includes the relations of `a`)
//! - `exclude(a,b.c)` drops fields by name or dotted path (`timestamps` drops
//!   `created_at`, `updated_at` and `deleted_at`)
//! - `only(a,b)` restricts the top-level fields
//! - `append("k":"v")` overrides top-level values in the final example
//!
//! Relations to models are left out unless requested, and recursion depth is
//! capped, so self-referencing and mutually referencing schemas always
//! terminate.

use crate::brackets::{angle_reference, between_brackets, split_list};
use crate::schema::registry::SchemaRegistry;
use crate::schema::PropertyDescriptor;
use log::{debug, warn};
use serde_json::{Map, Value};

/// Default recursion cap for relation expansion.
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Include/exclude/only/append directives for one example.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSpec {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub only: Vec<String>,
    pub append: Map<String, Value>,
}

impl FilterSpec {
    /// Reads the `with`, `exclude`, `only` and `append` tokens of an annotation line.
    pub fn from_line(line: &str) -> Self {
        let append_raw = between_brackets(line, "append");
        let append = if append_raw.is_empty() {
            Map::new()
        } else {
            match serde_json::from_str::<Value>(&format!("{{{}}}", append_raw)) {
                Ok(Value::Object(map)) => map,
                _ => {
                    warn!("Ignoring malformed append({}) in: {}", append_raw, line);
                    Map::new()
                }
            }
        };

        Self {
            include: split_list(&between_brackets(line, "with")),
            exclude: split_list(&between_brackets(line, "exclude")),
            only: split_list(&between_brackets(line, "only")),
            append,
        }
    }

    fn includes(&self, token: &str) -> bool {
        self.include.iter().any(|entry| entry == token)
    }

    /// `path` is included directly or as a prefix of a longer include path.
    fn includes_path(&self, path: &str) -> bool {
        self.include.iter().any(|entry| {
            entry == path
                || entry
                    .strip_prefix(path)
                    .is_some_and(|rest| rest.starts_with('.'))
        })
    }

    fn excludes(&self, token: &str) -> bool {
        self.exclude.iter().any(|entry| entry == token)
    }

    fn restricts_to(&self, key: &str) -> bool {
        self.only.iter().any(|entry| entry == key)
    }
}

/// Position of the schema being resolved inside the relation graph.
#[derive(Debug, Clone, Default)]
struct RelationPath {
    /// Dotted chain of relation fields traversed so far (empty at the top level)
    parent: String,
    /// First relation field of the chain
    first_hop: String,
    depth: usize,
}

impl RelationPath {
    fn is_root(&self) -> bool {
        self.parent.is_empty()
    }

    fn child(&self, key: &str) -> Self {
        if self.is_root() {
            Self {
                parent: key.to_string(),
                first_hop: key.to_string(),
                depth: 1,
            }
        } else {
            Self {
                parent: format!("{}.{}", self.parent, key),
                first_hop: self.first_hop.clone(),
                depth: self.depth + 1,
            }
        }
    }
}

/// Resolves schema names into example values.
pub struct ExampleResolver<'a> {
    registry: &'a SchemaRegistry,
    max_depth: usize,
}

impl<'a> ExampleResolver<'a> {
    pub fn new(registry: &'a SchemaRegistry) -> Self {
        Self {
            registry,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Overrides the recursion cap.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Example object for a schema, with the filter's `append` values merged on top.
    ///
    /// Unknown schema names resolve to an empty object.
    pub fn resolve(&self, schema_name: &str, filter: &FilterSpec) -> Value {
        let mut example = self
            .resolve_schema(schema_name, filter, &RelationPath::default())
            .unwrap_or_else(|| Value::Object(Map::new()));

        if let Value::Object(map) = &mut example {
            for (key, value) in &filter.append {
                map.insert(key.clone(), value.clone());
            }
        }
        example
    }

    /// Example for a reference such as `User` or `User[]`; lists get one element.
    pub fn resolve_reference(&self, reference: &str, filter: &FilterSpec) -> Value {
        let (name, is_array) = split_reference(reference);
        let example = self.resolve(name, filter);
        if is_array {
            Value::Array(vec![example])
        } else {
            example
        }
    }

    /// Replaces `"<Ref>"` strings inside a literal JSON example with resolved examples.
    ///
    /// Each string carries its own filter tokens, e.g. `"<User>.with(posts)"`.
    pub fn expand_inline_references(&self, value: Value) -> Value {
        match value {
            Value::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(key, value)| (key, self.expand_inline_references(value)))
                    .collect(),
            ),
            Value::Array(items) => Value::Array(
                items
                    .into_iter()
                    .map(|item| self.expand_inline_references(item))
                    .collect(),
            ),
            Value::String(text) => match angle_reference(&text) {
                Some(reference) => {
                    let filter = FilterSpec::from_line(&text);
                    self.resolve_reference(reference, &filter)
                }
                None => Value::String(text),
            },
            other => other,
        }
    }

    /// `None` means the whole branch is omitted by the caller.
    fn resolve_schema(
        &self,
        schema_name: &str,
        filter: &FilterSpec,
        path: &RelationPath,
    ) -> Option<Value> {
        let Some(schema) = self.registry.get(schema_name) else {
            debug!("Schema {} is not registered, using an empty example", schema_name);
            return Some(Value::Object(Map::new()));
        };

        if is_nested(path)
            && self.registry.is_model(schema_name)
            && !nested_branch_requested(path, filter)
        {
            debug!("Skipping unrequested relation branch {}", path.parent);
            return None;
        }

        let mut example = Map::new();
        for (key, property) in &schema.properties {
            let selected = path.is_root() && filter.restricts_to(key);
            if path.is_root() && !filter.only.is_empty() && !selected {
                continue;
            }
            if !selected
                && (is_excluded(key, &path.parent, filter)
                    || is_hidden_secret(key, filter)
                    || is_dropped_timestamp(key, filter))
            {
                continue;
            }

            let Some(target) = property.relation() else {
                example.insert(key.clone(), literal_example(property));
                continue;
            };

            if !selected && path.is_root() && self.is_unrequested_relation(key, target, filter) {
                continue;
            }

            if path.depth + 1 > self.max_depth {
                debug!("Relation depth cap reached at {}.{}", path.parent, key);
                example.insert(key.clone(), placeholder(property));
                continue;
            }

            let Some(nested) = self.resolve_schema(target, filter, &path.child(key)) else {
                continue;
            };
            let nested = if property.is_array {
                Value::Array(vec![nested])
            } else {
                nested
            };
            example.insert(key.clone(), nested);
        }

        Some(Value::Object(example))
    }

    /// Top-level model relations are dropped unless `relations` or the field is included.
    fn is_unrequested_relation(&self, key: &str, target: &str, filter: &FilterSpec) -> bool {
        self.registry.is_model(target) && !filter.includes("relations") && !filter.includes_path(key)
    }
}

/// Splits `User[]` into (`User`, true).
pub fn split_reference(reference: &str) -> (&str, bool) {
    let reference = reference.trim();
    match reference.strip_suffix("[]") {
        Some(name) => (name.trim(), true),
        None => (reference, false),
    }
}

/// Dropped by name or by `parent.field` path.
fn is_excluded(key: &str, parent: &str, filter: &FilterSpec) -> bool {
    filter.excludes(key) || (!parent.is_empty() && filter.excludes(&format!("{}.{}", parent, key)))
}

/// Password fields only appear when explicitly included or selected.
fn is_hidden_secret(key: &str, filter: &FilterSpec) -> bool {
    matches!(key, "password" | "password_confirmation")
        && !filter.includes(key)
        && !filter.restricts_to(key)
}

fn is_dropped_timestamp(key: &str, filter: &FilterSpec) -> bool {
    matches!(key, "created_at" | "updated_at" | "deleted_at") && filter.excludes("timestamps")
}

/// Relation of a relation, as opposed to a direct relation of the top-level schema.
fn is_nested(path: &RelationPath) -> bool {
    path.parent.contains('.')
}

/// A nested model branch is expanded only when its path was asked for.
///
/// `a.relations` opens the relations of `a` only, one level below it.
fn nested_branch_requested(path: &RelationPath, filter: &FilterSpec) -> bool {
    let enclosing = path
        .parent
        .rsplit_once('.')
        .map_or(path.parent.as_str(), |(enclosing, _)| enclosing);
    filter.includes_path(&path.parent)
        || filter.includes(&format!("{}.relations", enclosing))
        || (path.depth == 2 && filter.includes(&format!("{}.relations", path.first_hop)))
}

fn literal_example(property: &PropertyDescriptor) -> Value {
    if property.is_array {
        if property.example.is_null() {
            Value::Array(Vec::new())
        } else {
            Value::Array(vec![property.example.clone()])
        }
    } else {
        property.example.clone()
    }
}

fn placeholder(property: &PropertyDescriptor) -> Value {
    if property.is_array {
        Value::Array(Vec::new())
    } else {
        Value::Object(Map::new())
    }
}
