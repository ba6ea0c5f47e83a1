use crate::example_resolver::split_reference;
use crate::schema::registry::SchemaRegistry;
use crate::schema::{builtin_type, PropertyDescriptor, SchemaDefinition, TypeIndicator};
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Prefix of every component schema reference.
pub const SCHEMA_REF_PREFIX: &str = "#/components/schemas/";

/// Schema generator - converts registry definitions and type names to OpenAPI schemas
pub struct SchemaGenerator;

/// OpenAPI Schema definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Reference to another schema
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// The type of the schema (string, integer, object, array, etc.)
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,
    /// Format for primitive types (e.g., "email", "date-time", "float")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,
    /// Enum values for enum types
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
    /// Items schema for array types
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    /// Properties for object types
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<IndexMap<String, Schema>>,
}

impl Schema {
    /// A schema carrying only a type.
    pub fn of_type(schema_type: &str) -> Self {
        Self {
            schema_type: Some(schema_type.to_string()),
            ..Self::default()
        }
    }

    /// A `$ref` to a component schema.
    pub fn reference(schema_name: &str) -> Self {
        Self {
            reference: Some(format!("{}{}", SCHEMA_REF_PREFIX, schema_name)),
            ..Self::default()
        }
    }

    /// An array of `items`.
    pub fn array(items: Schema) -> Self {
        Self {
            schema_type: Some("array".to_string()),
            items: Some(Box::new(items)),
            ..Self::default()
        }
    }
}

impl SchemaGenerator {
    /// Schema for a reference such as `User` or `User[]`.
    pub fn reference_schema(reference: &str) -> Schema {
        let (name, is_array) = split_reference(reference);
        if is_array {
            Schema::array(Schema::reference(name))
        } else {
            Schema::reference(name)
        }
    }

    /// Schema for a literal JSON example: `array` for lists, `object` otherwise.
    pub fn literal_schema(example: &Value) -> Schema {
        if example.is_array() {
            Schema::of_type("array")
        } else {
            Schema::of_type("object")
        }
    }

    /// Schema for a parameter type name (`string`, `integer`, `float`, ...).
    pub fn primitive_schema(type_name: &str) -> Schema {
        match builtin_type(type_name) {
            Some((schema_type, format)) => Schema {
                format: format.map(str::to_string),
                ..Schema::of_type(schema_type)
            },
            None => {
                debug!("Unknown parameter type: {}, using string", type_name);
                Schema::of_type("string")
            }
        }
    }

    /// Schema for one property of a definition.
    pub fn property_schema(property: &PropertyDescriptor) -> Schema {
        let element = match &property.type_indicator {
            TypeIndicator::Reference(name) => Schema::reference(name),
            TypeIndicator::Primitive(primitive) => Schema {
                format: property.format.clone(),
                enum_values: property.enum_values.clone(),
                example: (!property.example.is_null()).then(|| property.example.clone()),
                ..Schema::of_type(primitive)
            },
        };

        let mut schema = if property.is_array {
            Schema::array(element)
        } else {
            element
        };
        if property.nullable && schema.reference.is_none() {
            schema.nullable = Some(true);
        }
        schema
    }

    /// Component schema for a registry definition.
    pub fn definition_schema(definition: &SchemaDefinition) -> Schema {
        let properties = definition
            .properties
            .iter()
            .map(|(name, property)| (name.clone(), Self::property_schema(property)))
            .collect();

        Schema {
            description: Some(definition.kind.label().to_string()),
            properties: Some(properties),
            ..Schema::of_type("object")
        }
    }

    /// The `components.schemas` catalog, in registry order.
    pub fn components(registry: &SchemaRegistry) -> IndexMap<String, Schema> {
        debug!("Generating {} component schemas", registry.len());
        registry
            .iter()
            .map(|definition| (definition.name.clone(), Self::definition_schema(definition)))
            .collect()
    }
}
