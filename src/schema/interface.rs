//! Interface source parsing.
//!
//! Detects `interface Name { ... }` blocks in TypeScript sources and turns each
//! `field: Type` member into a [`PropertyDescriptor`]. Comment hints on the
//! line directly above a member (`// @enum(a,b)`, `// @example(x)`,
//! `// @format(f)`) refine the property.

use super::examples::{coerce_example, ExampleGenerator};
use super::{
    apply_field_conventions, builtin_type, PropertyDescriptor, SchemaDefinition, SchemaKind,
    SourceBlob, TypeIndicator,
};
use crate::brackets::{between_brackets, split_list};
use log::debug;
use serde_json::{json, Value};

/// Parser for interface source files.
pub struct InterfaceParser;

impl InterfaceParser {
    /// Parses every interface declared in the blob.
    pub fn parse(blob: &SourceBlob, examples: &mut ExampleGenerator) -> Vec<SchemaDefinition> {
        debug!("Parsing interfaces from {}", blob.path);

        let mut schemas = Vec::new();
        let mut current: Option<SchemaDefinition> = None;
        let mut hint: Option<String> = None;
        let mut skip_depth = 0usize;

        for line in logical_lines(&blob.text) {
            if is_comment(&line) {
                hint = Some(line);
                continue;
            }

            let line = line
                .trim_start_matches("export ")
                .trim_start_matches("default ")
                .trim_start_matches("declare ")
                .trim();

            if let Some(rest) = line.strip_prefix("interface ") {
                if let Some(done) = current.take() {
                    schemas.push(done);
                }
                let name: String = rest
                    .chars()
                    .take_while(|c| c.is_alphanumeric() || *c == '_')
                    .collect();
                debug!("Found interface {}", name);
                current = Some(SchemaDefinition::new(name, SchemaKind::Interface));
                hint = None;
                continue;
            }

            let Some(schema) = current.as_mut() else {
                hint = None;
                continue;
            };

            if skip_depth > 0 {
                if line == "}" {
                    skip_depth -= 1;
                } else if line.ends_with('{') {
                    skip_depth += 1;
                }
                continue;
            }

            if line == "}" {
                if let Some(done) = current.take() {
                    schemas.push(done);
                }
                continue;
            }

            if let Some((field, type_name)) = line.split_once(':') {
                if type_name.trim_end().ends_with('{') {
                    // inline object type, members belong to the nested literal
                    skip_depth = 1;
                }
                if let Some((name, property)) =
                    parse_member(field, type_name, hint.as_deref(), examples)
                {
                    schema.properties.insert(name, property);
                }
            }
            hint = None;
        }

        if let Some(done) = current.take() {
            schemas.push(done);
        }

        debug!("Parsed {} interfaces from {}", schemas.len(), blob.path);
        schemas
    }
}

/// Parses one `field: Type` member.
fn parse_member(
    field: &str,
    type_name: &str,
    hint: Option<&str>,
    examples: &mut ExampleGenerator,
) -> Option<(String, PropertyDescriptor)> {
    let mut field = field.trim().trim_start_matches("readonly ").trim().to_string();
    let mut nullable = false;
    if field.ends_with('?') {
        field.pop();
        nullable = true;
    }
    let field = field.trim_matches(|c| c == '"' || c == '\'').to_string();
    if field.is_empty() || field.contains(' ') || field.contains('(') {
        return None;
    }

    let mut type_name = type_name.trim().trim_end_matches(',').trim().to_string();
    if type_name.ends_with('{') {
        type_name = "object".to_string();
    }
    let (base, union_nullable) = strip_null_union(&type_name);
    nullable |= union_nullable;

    let (base, is_array) = strip_array(&base);
    let hint = hint.unwrap_or("");
    let enums = split_list(&between_brackets(hint, "enum"));
    let hint_example = between_brackets(hint, "example");
    let hint_format = between_brackets(hint, "format");

    let mut property = if !enums.is_empty() {
        PropertyDescriptor::primitive("string", json!(enums[0]))
    } else if let Some((primitive, format)) = builtin_type(&base) {
        let mut property = PropertyDescriptor::primitive(primitive, Value::Null);
        property.format = format.map(str::to_string);
        property
    } else if base == "any" || base.contains('<') || base.starts_with('{') {
        if base == "any" {
            PropertyDescriptor::reference("Any")
        } else {
            PropertyDescriptor::primitive("object", Value::Null)
        }
    } else {
        PropertyDescriptor::reference(&base)
    };

    property.is_array = is_array;
    property.nullable = nullable;
    if !hint_format.is_empty() {
        property.format = Some(hint_format);
    }
    if !enums.is_empty() {
        property.enum_values = Some(enums);
    }

    if let TypeIndicator::Primitive(primitive) = &property.type_indicator {
        if !hint_example.is_empty() {
            property.example = coerce_example(&hint_example, primitive);
        } else if property.example.is_null() {
            let primitive = primitive.clone();
            property.example = examples
                .by_field(&field)
                .unwrap_or_else(|| examples.by_type(&primitive, property.format.as_deref()));
        }
    }

    apply_field_conventions(&field, &mut property);
    Some((field, property))
}

/// Drops `null`/`undefined` members of a union type and keeps the first remaining one.
pub(crate) fn strip_null_union(type_name: &str) -> (String, bool) {
    if !type_name.contains('|') {
        return (type_name.trim().to_string(), false);
    }
    let mut nullable = false;
    let mut kept = Vec::new();
    for part in type_name.split('|').map(str::trim) {
        if part == "null" || part == "undefined" {
            nullable = true;
        } else if !part.is_empty() {
            kept.push(part);
        }
    }
    (kept.first().copied().unwrap_or("any").to_string(), nullable)
}

/// Recognizes `T[]` and `Array<T>`.
pub(crate) fn strip_array(type_name: &str) -> (String, bool) {
    let type_name = type_name.trim();
    if let Some(inner) = type_name.strip_suffix("[]") {
        return (inner.trim().to_string(), true);
    }
    if let Some(inner) = type_name
        .strip_prefix("Array<")
        .and_then(|rest| rest.strip_suffix('>'))
    {
        return (inner.trim().to_string(), true);
    }
    (type_name.to_string(), false)
}

fn is_comment(line: &str) -> bool {
    line.starts_with("//") || line.starts_with("/*") || line.starts_with('*')
}

/// Splits source text into one declaration per line.
///
/// Code lines are broken after `{`, at `;` and around `}` so single-line
/// declarations such as `interface User { id: number; email: string; }` read
/// the same as multi-line ones. Comment lines are kept whole.
fn logical_lines(text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        if is_comment(line) {
            lines.push(line.to_string());
            continue;
        }

        let mut current = String::new();
        let flush = |current: &mut String, lines: &mut Vec<String>| {
            let piece = current.trim();
            if !piece.is_empty() {
                lines.push(piece.to_string());
            }
            current.clear();
        };
        for ch in line.chars() {
            match ch {
                '{' => {
                    current.push('{');
                    flush(&mut current, &mut lines);
                }
                ';' => flush(&mut current, &mut lines),
                '}' => {
                    flush(&mut current, &mut lines);
                    lines.push("}".to_string());
                }
                _ => current.push(ch),
            }
        }
        flush(&mut current, &mut lines);
    }
    lines
}
