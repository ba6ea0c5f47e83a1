//! Model source parsing.
//!
//! Lucid models declare their serialized columns as class fields
//! (`declare email: string`, `public name: string`) with decorators either on
//! the same line or the line above. Methods, static members and fields hidden
//! from serialization are skipped. Relation fields (`HasMany<typeof Post>`)
//! become schema references.

use super::examples::{coerce_example, ExampleGenerator, DATE_TIME_EXAMPLE};
use super::interface::{strip_array, strip_null_union};
use super::{
    apply_field_conventions, builtin_type, to_pascal_case, to_snake_case, PropertyDescriptor,
    SchemaDefinition, SchemaKind, SourceBlob, TypeIndicator,
};
use crate::brackets::{between_brackets, split_list};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};

static CLASS_NAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:export\s+)?(?:default\s+)?class\s+(\w+)").unwrap());

static TYPEOF_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"typeof\s+(\w+)").unwrap());

const COLLECTION_RELATIONS: [&str; 6] = [
    "HasMany",
    "ManyToMany",
    "HasManyThrough",
    "@hasMany",
    "@manyToMany",
    "@hasManyThrough",
];

/// Parser for model source files.
pub struct ModelParser {
    snake_case: bool,
}

impl ModelParser {
    /// Creates a parser; `snake_case` converts field names before they become property keys.
    pub fn new(snake_case: bool) -> Self {
        Self { snake_case }
    }

    /// Parses the model declared in the blob.
    ///
    /// The schema is named after the declared class, or after the file name
    /// when no class declaration is found.
    pub fn parse(&self, blob: &SourceBlob, examples: &mut ExampleGenerator) -> SchemaDefinition {
        debug!("Parsing model from {}", blob.path);

        let mut name: Option<String> = None;
        let mut soft_delete = false;
        let mut schema = SchemaDefinition::new(String::new(), SchemaKind::Model);
        // comment and decorator lines collected since the last declaration
        let mut pending = String::new();
        let mut decorator_depth = 0i32;

        for raw in blob.text.lines() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }

            if name.is_none() {
                if let Some(captures) = CLASS_NAME_REGEX.captures(line) {
                    name = Some(captures[1].to_string());
                }
            }
            if line.contains("@swagger-softdelete") || line.contains("SoftDeletes") {
                soft_delete = true;
            }

            if decorator_depth > 0 {
                decorator_depth += paren_balance(line);
                pending.push_str(line);
                pending.push('\n');
                continue;
            }

            let (decorators, declaration) = split_decorators(line);
            if is_comment(line) || (line.starts_with('@') && declaration.is_empty()) {
                if !is_comment(line) {
                    decorator_depth = paren_balance(line).max(0);
                }
                pending.push_str(line);
                pending.push('\n');
                continue;
            }

            let hint = std::mem::take(&mut pending);
            if is_static(line) || is_hidden(&hint) || is_hidden(decorators) {
                continue;
            }

            let Some((field, type_name)) = split_declaration(declaration) else {
                continue;
            };

            let field = if self.snake_case {
                to_snake_case(&field)
            } else {
                field
            };
            let property = self.parse_field(&field, &type_name, line, &hint, examples);
            debug!("Parsed model field {}", field);
            schema.properties.insert(field, property);
        }

        if soft_delete {
            let mut deleted_at = PropertyDescriptor::primitive("string", json!(DATE_TIME_EXAMPLE));
            deleted_at.format = Some("date-time".to_string());
            schema.properties.insert("deleted_at".to_string(), deleted_at);
        }

        schema.name = name.unwrap_or_else(|| to_pascal_case(blob.stem()));
        debug!(
            "Parsed model {} with {} properties",
            schema.name,
            schema.properties.len()
        );
        schema
    }

    fn parse_field(
        &self,
        field: &str,
        type_name: &str,
        line: &str,
        hint: &str,
        examples: &mut ExampleGenerator,
    ) -> PropertyDescriptor {
        let (base, nullable) = strip_null_union(type_name);
        let is_collection = COLLECTION_RELATIONS.iter().any(|marker| line.contains(marker));

        let enums = if hint.contains("@enum") {
            split_list(&between_brackets(hint, "enum"))
        } else {
            Vec::new()
        };
        let hint_example = if hint.contains("@example") {
            between_brackets(hint, "example")
        } else {
            String::new()
        };
        let hint_format = if hint.contains("@format") {
            between_brackets(hint, "format")
        } else {
            String::new()
        };

        let mut property = if let Some(captures) = TYPEOF_REGEX.captures(&base) {
            let mut property = PropertyDescriptor::reference(&captures[1]);
            property.is_array = is_collection;
            property
        } else {
            let (base, is_array) = strip_array(&base);
            let mut property = if !enums.is_empty() {
                PropertyDescriptor::primitive("string", Value::Null)
            } else if let Some((primitive, format)) = builtin_type(&base) {
                let mut property = PropertyDescriptor::primitive(primitive, Value::Null);
                property.format = format.map(str::to_string);
                property
            } else if base == "any" {
                PropertyDescriptor::reference("Any")
            } else if base.contains('<') || base.starts_with('{') {
                PropertyDescriptor::primitive("object", Value::Null)
            } else {
                PropertyDescriptor::reference(&base)
            };
            property.is_array = is_array || is_collection;
            property
        };

        property.nullable = nullable;
        if !hint_format.is_empty() {
            property.format = Some(hint_format);
        }

        if let TypeIndicator::Primitive(primitive) = &property.type_indicator {
            let primitive = primitive.clone();
            property.example = if !hint_example.is_empty() {
                coerce_example(&hint_example, &primitive)
            } else if let Some(first) = enums.first() {
                json!(first)
            } else if primitive == "number" || primitive == "integer" {
                json!(examples.random_integer())
            } else {
                examples
                    .by_field(field)
                    .unwrap_or_else(|| examples.by_type(&primitive, property.format.as_deref()))
            };
            if primitive == "boolean" {
                property.example = json!(true);
            }
        }
        if !enums.is_empty() {
            property.enum_values = Some(enums);
        }

        apply_field_conventions(field, &mut property);
        property
    }
}

fn is_comment(line: &str) -> bool {
    line.starts_with("//") || line.starts_with("/*") || line.starts_with('*')
}

fn is_static(line: &str) -> bool {
    line.starts_with("public static ")
        || line.starts_with("private static ")
        || line.starts_with("protected static ")
        || line.starts_with("static ")
}

fn paren_balance(line: &str) -> i32 {
    line.chars().fold(0, |depth, ch| match ch {
        '(' => depth + 1,
        ')' => depth - 1,
        _ => depth,
    })
}

/// Marker comments or decorator options that hide a field.
fn is_hidden(previous: &str) -> bool {
    previous.contains("serializeAs: null")
        || previous.contains("serializeAs:null")
        || previous.contains("@no-swagger")
}

/// Splits leading decorators (`@column({ ... })`) from the declaration.
fn split_decorators(line: &str) -> (&str, &str) {
    let mut rest = line;
    let mut consumed = 0;
    while rest.starts_with('@') {
        let name_len = rest[1..]
            .find(|c: char| !(c.is_alphanumeric() || c == '.' || c == '_'))
            .map_or(rest.len(), |i| i + 1);
        let mut end = name_len;
        if rest[end..].starts_with('(') {
            let mut depth = 0usize;
            let mut close = None;
            for (i, ch) in rest[end..].char_indices() {
                match ch {
                    '(' => depth += 1,
                    ')' => {
                        depth -= 1;
                        if depth == 0 {
                            close = Some(end + i + 1);
                            break;
                        }
                    }
                    _ => {}
                }
            }
            match close {
                Some(close) => end = close,
                // unbalanced, the decorator continues on following lines
                None => return (line, ""),
            }
        }
        let trimmed = rest[end..].trim_start();
        consumed += rest.len() - trimmed.len();
        rest = trimmed;
    }
    (&line[..consumed], rest)
}

/// Extracts `(field, type)` from a field or accessor declaration.
fn split_declaration(declaration: &str) -> Option<(String, String)> {
    let (field, type_name) = if let Some(rest) = declaration.strip_prefix("public get ") {
        let open = rest.find('(')?;
        let field = &rest[..open];
        let after = &rest[open..];
        let type_name = after
            .split_once("):")
            .map(|(_, t)| t)
            .unwrap_or("any");
        (field.to_string(), type_name.to_string())
    } else {
        let rest = declaration
            .strip_prefix("declare ")
            .or_else(|| declaration.strip_prefix("public declare "))
            .or_else(|| declaration.strip_prefix("public "))?;
        if rest.contains('(') && !rest.contains("typeof") {
            // method
            return None;
        }
        let (field, type_name) = rest.split_once(':')?;
        (field.to_string(), type_name.to_string())
    };

    let field = field.trim().trim_end_matches(['?', '!']).trim().to_string();
    if field.is_empty() || field.contains(' ') {
        return None;
    }

    let mut type_name = type_name.trim();
    if let Some((before, _)) = type_name.split_once(" = ") {
        type_name = before;
    }
    let type_name = type_name
        .trim_end_matches('{')
        .trim()
        .trim_end_matches(';')
        .trim()
        .to_string();
    Some((field, type_name))
}
