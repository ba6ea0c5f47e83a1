use super::examples::ExampleGenerator;
use super::interface::InterfaceParser;
use super::model::ModelParser;
use super::{SchemaDefinition, SchemaKind, SourceBlob};
use indexmap::IndexMap;
use log::{debug, warn};

/// Name of the builtin open object schema.
pub const ANY_SCHEMA: &str = "Any";

/// Catalog of every schema known to a generation run, keyed by name.
///
/// The registry is seeded with the builtin `Any` schema, then filled with
/// interfaces followed by models. A later definition with an already known
/// name replaces the earlier one; the collision is logged. Once built, the
/// registry is only read.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    schemas: IndexMap<String, SchemaDefinition>,
}

impl SchemaRegistry {
    /// Creates a registry holding only the builtin `Any` schema.
    pub fn new() -> Self {
        let mut schemas = IndexMap::new();
        schemas.insert(
            ANY_SCHEMA.to_string(),
            SchemaDefinition::new(ANY_SCHEMA, SchemaKind::Builtin),
        );
        Self { schemas }
    }

    /// Parses interface and model sources into a registry.
    pub fn build(
        interfaces: &[SourceBlob],
        models: &[SourceBlob],
        snake_case: bool,
        examples: &mut ExampleGenerator,
    ) -> Self {
        debug!(
            "Building schema registry from {} interface and {} model sources",
            interfaces.len(),
            models.len()
        );

        let mut registry = Self::new();
        for blob in interfaces {
            for schema in InterfaceParser::parse(blob, examples) {
                registry.insert(schema);
            }
        }

        let parser = ModelParser::new(snake_case);
        for blob in models {
            registry.insert(parser.parse(blob, examples));
        }

        debug!("Schema registry holds {} schemas", registry.len());
        registry
    }

    /// Adds a schema, replacing any schema with the same name.
    pub fn insert(&mut self, schema: SchemaDefinition) {
        if let Some(previous) = self.schemas.get(&schema.name) {
            warn!(
                "Schema {} ({}) is defined more than once, the last definition ({}) wins",
                schema.name,
                previous.kind.label(),
                schema.kind.label()
            );
        }
        self.schemas.insert(schema.name.clone(), schema);
    }

    pub fn get(&self, name: &str) -> Option<&SchemaDefinition> {
        self.schemas.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    /// Whether `name` is a known schema of kind [`SchemaKind::Model`].
    pub fn is_model(&self, name: &str) -> bool {
        self.schemas
            .get(name)
            .is_some_and(|schema| schema.kind == SchemaKind::Model)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SchemaDefinition> {
        self.schemas.values()
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}
