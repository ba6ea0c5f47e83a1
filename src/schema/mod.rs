//! Schema definitions extracted from model and interface sources.
//!
//! Both source kinds are reduced to the same shape: a named, ordered map of
//! properties. The [`registry`] module collects them into one catalog that the
//! example resolver and the document assembler read from.

pub mod examples;
pub mod interface;
pub mod model;
pub mod registry;

use indexmap::IndexMap;
use serde_json::Value;

/// Where a schema definition came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    /// A persisted data model (relations between models are filtered by default)
    Model,
    /// A plain TypeScript interface
    Interface,
    /// A definition seeded by the generator itself (`Any`)
    Builtin,
}

impl SchemaKind {
    /// Label emitted as the schema description in the document.
    pub fn label(&self) -> &'static str {
        match self {
            SchemaKind::Model => "Model",
            SchemaKind::Interface => "Interface",
            SchemaKind::Builtin => "Any JSON object not defined as schema",
        }
    }
}

/// A named object shape.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaDefinition {
    pub name: String,
    pub kind: SchemaKind,
    pub properties: IndexMap<String, PropertyDescriptor>,
}

impl SchemaDefinition {
    pub fn new(name: impl Into<String>, kind: SchemaKind) -> Self {
        Self {
            name: name.into(),
            kind,
            properties: IndexMap::new(),
        }
    }
}

/// The type of a single property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeIndicator {
    /// An OpenAPI primitive type name (`string`, `number`, `integer`, `boolean`, `object`)
    Primitive(String),
    /// The name of another schema
    Reference(String),
}

impl TypeIndicator {
    pub fn reference_name(&self) -> Option<&str> {
        match self {
            TypeIndicator::Reference(name) => Some(name),
            TypeIndicator::Primitive(_) => None,
        }
    }
}

/// One property of a schema.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDescriptor {
    pub type_indicator: TypeIndicator,
    pub is_array: bool,
    pub nullable: bool,
    pub format: Option<String>,
    /// Literal example; `Value::Null` when none should be exposed
    pub example: Value,
    pub enum_values: Option<Vec<String>>,
}

impl PropertyDescriptor {
    pub fn primitive(type_name: &str, example: Value) -> Self {
        Self {
            type_indicator: TypeIndicator::Primitive(type_name.to_string()),
            is_array: false,
            nullable: false,
            format: None,
            example,
            enum_values: None,
        }
    }

    pub fn reference(schema_name: &str) -> Self {
        Self {
            type_indicator: TypeIndicator::Reference(schema_name.to_string()),
            is_array: false,
            nullable: false,
            format: None,
            example: Value::Null,
            enum_values: None,
        }
    }

    /// The referenced schema name, if this property is a relation.
    pub fn relation(&self) -> Option<&str> {
        self.type_indicator.reference_name()
    }
}

/// Raw text of one model or interface source file.
#[derive(Debug, Clone)]
pub struct SourceBlob {
    /// Logical path of the file, used for diagnostics and name fallbacks
    pub path: String,
    pub text: String,
}

impl SourceBlob {
    pub fn new(path: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }

    /// File name without directories or extension.
    pub fn stem(&self) -> &str {
        let file = self.path.rsplit(['/', '\\']).next().unwrap_or(&self.path);
        file.split('.').next().unwrap_or(file)
    }
}

/// Normalized primitive for a TypeScript/Lucid type name, with its format.
///
/// Returns `None` for names that are not builtin and therefore refer to
/// another schema.
pub(crate) fn builtin_type(raw: &str) -> Option<(&'static str, Option<&'static str>)> {
    let mapped = match raw.trim().to_lowercase().as_str() {
        "string" => ("string", None),
        "number" => ("number", None),
        "integer" | "bigint" => ("integer", None),
        "float" | "double" => ("number", Some("float")),
        "boolean" => ("boolean", None),
        "date" => ("string", Some("date")),
        "datetime" => ("string", Some("date-time")),
        "object" | "unknown" => ("object", None),
        _ => return None,
    };
    Some(mapped)
}

/// Applies the conventions tied to well-known field names.
///
/// `email` gets the email format and example, passwords get the password
/// format and never expose an example, timestamp names become date-times.
pub(crate) fn apply_field_conventions(field: &str, property: &mut PropertyDescriptor) {
    match field {
        "email" => {
            property.type_indicator = TypeIndicator::Primitive("string".to_string());
            property.format = Some("email".to_string());
            property.example = Value::String(examples::EMAIL_EXAMPLE.to_string());
        }
        "password" | "password_confirmation" => {
            property.type_indicator = TypeIndicator::Primitive("string".to_string());
            property.format = Some("password".to_string());
            property.example = Value::Null;
        }
        "created_at" | "updated_at" | "deleted_at" => {
            if property.type_indicator == TypeIndicator::Primitive("string".to_string()) {
                property.format = Some("date-time".to_string());
                property.example = Value::String(examples::DATE_TIME_EXAMPLE.to_string());
            }
        }
        _ => {}
    }
}

/// Converts a camelCase or PascalCase identifier to snake_case.
pub(crate) fn to_snake_case(name: &str) -> String {
    let mut result = String::new();
    let chars: Vec<char> = name.chars().collect();
    for (i, &ch) in chars.iter().enumerate() {
        if ch.is_uppercase() {
            let prev_lower = i > 0 && !chars[i - 1].is_uppercase() && chars[i - 1] != '_';
            let next_lower = chars.get(i + 1).is_some_and(|c| c.is_lowercase());
            let prev_upper = i > 0 && chars[i - 1].is_uppercase();
            if i > 0 && (prev_lower || (prev_upper && next_lower)) {
                result.push('_');
            }
            result.extend(ch.to_lowercase());
        } else {
            result.push(ch);
        }
    }
    result
}

/// Converts a snake_case or kebab-case file stem to PascalCase.
pub(crate) fn to_pascal_case(name: &str) -> String {
    name.split(['_', '-'])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}
