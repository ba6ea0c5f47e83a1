//! Controller annotation parsing.
//!
//! Controller actions are documented with structured comment blocks:
//!
//! ```text
//! /**
//!  * @summary Show a user
//!  * @paramPath id - The user id - @type(integer) @required
//!  * @responseBody 200 - <User>.with(posts)
//!  * @responseBody 404 - User not found
//!  */
//! async show({ params }: HttpContext) {}
//! ```
//!
//! [`controller`] finds the blocks in a source file, [`directive`] tokenizes
//! each line, and [`AnnotationParser`] folds the directives of one block into
//! an [`AnnotationRecord`].

pub mod controller;
pub mod directive;

use crate::brackets::between_brackets;
use crate::config::GeneratorOptions;
use crate::example_resolver::ExampleResolver;
use crate::extractor::{ParamDescriptor, ParameterLocation};
use crate::schema::examples::coerce_example;
use crate::schema::registry::SchemaRegistry;
use crate::schema_generator::{Schema, SchemaGenerator};
use directive::{Directive, HeaderDirective, ParamMeta, Payload};
use indexmap::IndexMap;
use log::{debug, error, warn};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Documentation of one controller action.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationRecord {
    pub action: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub operation_id: Option<String>,
    pub tag: Option<String>,
    /// Keyed by status code
    pub responses: IndexMap<String, ResponseSpec>,
    pub request_body: Option<RequestBodySpec>,
    /// Keyed by parameter name
    pub parameters: IndexMap<String, ParamDescriptor>,
}

/// OpenAPI response object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseSpec {
    #[serde(skip)]
    pub status: String,
    pub description: String,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub headers: IndexMap<String, HeaderSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<IndexMap<String, MediaContent>>,
}

impl ResponseSpec {
    /// A response carrying only the `Returns **<code>** (<reason>)` description.
    pub fn new(status: &str) -> Self {
        Self {
            status: status.to_string(),
            description: default_description(status),
            headers: IndexMap::new(),
            content: None,
        }
    }
}

/// OpenAPI media type object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaContent {
    pub schema: Schema,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
}

/// OpenAPI request body object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestBodySpec {
    pub content: IndexMap<String, MediaContent>,
}

impl RequestBodySpec {
    /// Empty `application/json` body for write methods without an authored body.
    pub fn empty_json() -> Self {
        let mut content = IndexMap::new();
        content.insert(
            "application/json".to_string(),
            MediaContent {
                schema: Schema::of_type("object"),
                example: None,
            },
        );
        Self { content }
    }
}

/// OpenAPI header object, also the shape of `commonHeaders` entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderSpec {
    #[serde(default)]
    pub description: String,
    #[serde(default = "string_schema")]
    pub schema: Schema,
}

fn string_schema() -> Schema {
    Schema::of_type("string")
}

/// `Returns **404** (Not Found)`
pub fn default_description(status: &str) -> String {
    match status_reason(status) {
        Some(reason) => format!("Returns **{}** ({})", status, reason),
        None => format!("Returns **{}**", status),
    }
}

fn status_reason(status: &str) -> Option<&'static str> {
    let reason = match status {
        "100" => "Continue",
        "101" => "Switching Protocols",
        "200" => "OK",
        "201" => "Created",
        "202" => "Accepted",
        "203" => "Non Authoritative Information",
        "204" => "No Content",
        "205" => "Reset Content",
        "206" => "Partial Content",
        "301" => "Moved Permanently",
        "302" => "Found",
        "303" => "See Other",
        "304" => "Not Modified",
        "307" => "Temporary Redirect",
        "308" => "Permanent Redirect",
        "400" => "Bad Request",
        "401" => "Unauthorized",
        "402" => "Payment Required",
        "403" => "Forbidden",
        "404" => "Not Found",
        "405" => "Method Not Allowed",
        "406" => "Not Acceptable",
        "408" => "Request Timeout",
        "409" => "Conflict",
        "410" => "Gone",
        "413" => "Request Too Long",
        "415" => "Unsupported Media Type",
        "422" => "Unprocessable Entity",
        "423" => "Locked",
        "429" => "Too Many Requests",
        "500" => "Internal Server Error",
        "501" => "Not Implemented",
        "502" => "Bad Gateway",
        "503" => "Service Unavailable",
        "504" => "Gateway Timeout",
        _ => return None,
    };
    Some(reason)
}

/// Folds the annotation lines of one action into an [`AnnotationRecord`].
pub struct AnnotationParser<'a> {
    resolver: ExampleResolver<'a>,
    options: &'a GeneratorOptions,
}

impl<'a> AnnotationParser<'a> {
    pub fn new(registry: &'a SchemaRegistry, options: &'a GeneratorOptions) -> Self {
        Self {
            resolver: ExampleResolver::new(registry).with_max_depth(options.max_example_depth),
            options,
        }
    }

    /// Parses trimmed, non-blank comment lines. Unknown lines are ignored.
    pub fn parse(&self, action: &str, lines: &[String]) -> AnnotationRecord {
        debug!("Parsing {} annotation lines for action {}", lines.len(), action);

        let mut record = AnnotationRecord {
            action: action.to_string(),
            ..AnnotationRecord::default()
        };

        for line in lines {
            let Some(directive) = Directive::parse(line) else {
                continue;
            };
            match directive {
                Directive::Summary(text) => record.summary = Some(text),
                Directive::Description(text) => record.description = Some(text),
                Directive::OperationId(text) => record.operation_id = Some(text),
                Directive::Tag(text) => record.tag = Some(text),
                Directive::ResponseBody {
                    status,
                    description,
                    payload,
                } => self.apply_response_body(&mut record, &status, &description, &payload, line),
                Directive::ResponseHeader { status, header } => {
                    self.apply_response_header(&mut record, &status, header)
                }
                Directive::RequestBody(payload) => {
                    if let Some(content) = self.payload_content(&payload, line) {
                        record.request_body = Some(RequestBodySpec {
                            content: json_media(content),
                        });
                    }
                }
                Directive::RequestFormDataBody(payload) => {
                    if let Some(body) = form_data_body(&payload, line) {
                        record.request_body = Some(body);
                    }
                }
                Directive::Param {
                    location,
                    name,
                    description,
                    meta,
                } => {
                    let param = build_param(&name, location, description, &meta);
                    record.parameters.insert(name, param);
                }
                Directive::ParamUse(groups) => self.apply_param_groups(&mut record, &groups),
            }
        }

        record
    }

    fn apply_response_body(
        &self,
        record: &mut AnnotationRecord,
        status: &str,
        description: &str,
        payload: &Payload,
        line: &str,
    ) {
        let response = record
            .responses
            .entry(status.to_string())
            .or_insert_with(|| ResponseSpec::new(status));

        response.description = match payload {
            Payload::Reference { reference, filter } => {
                let mut text = if description.is_empty() {
                    reference_phrase(reference)
                } else {
                    description.to_string()
                };
                for (label, values) in [
                    ("with", &filter.include),
                    ("exclude", &filter.exclude),
                    ("only", &filter.only),
                ] {
                    if !values.is_empty() {
                        text.push_str(&format!(" ({}: {})", label, values.join(", ")));
                    }
                }
                text
            }
            _ if description.is_empty() => default_description(status),
            _ => description.to_string(),
        };

        if let Some(content) = self.payload_content(payload, line) {
            response.content = Some(json_media(content));
        }
    }

    fn apply_response_header(
        &self,
        record: &mut AnnotationRecord,
        status: &str,
        header: HeaderDirective,
    ) {
        let response = record
            .responses
            .entry(status.to_string())
            .or_insert_with(|| ResponseSpec::new(status));

        match header {
            HeaderDirective::Use(groups) => {
                for group in &groups {
                    match self.options.common_headers.get(group) {
                        Some(headers) => {
                            for (name, spec) in headers {
                                response.headers.insert(name.clone(), spec.clone());
                            }
                        }
                        None => warn!("Unknown header group {} in @use", group),
                    }
                }
            }
            HeaderDirective::Single {
                name,
                description,
                meta,
            } => {
                let type_name = between_brackets(&meta, "type");
                let mut schema = if type_name.is_empty() {
                    Schema::of_type("string")
                } else {
                    SchemaGenerator::primitive_schema(&type_name)
                };
                let example = between_brackets(&meta, "example");
                if !example.is_empty() {
                    let schema_type = schema.schema_type.clone().unwrap_or_default();
                    schema.example = Some(coerce_example(&example, &schema_type));
                }
                response.headers.insert(name, HeaderSpec { description, schema });
            }
        }
    }

    fn apply_param_groups(&self, record: &mut AnnotationRecord, groups: &[String]) {
        for group in groups {
            match self.options.common_parameters.get(group) {
                Some(params) => {
                    for param in params {
                        record.parameters.insert(param.name.clone(), param.clone());
                    }
                }
                None => warn!("Unknown parameter group {} in @paramUse", group),
            }
        }
    }

    /// Schema and example for a JSON or reference payload.
    fn payload_content(&self, payload: &Payload, line: &str) -> Option<MediaContent> {
        match payload {
            Payload::Reference { reference, filter } => Some(MediaContent {
                schema: SchemaGenerator::reference_schema(reference),
                example: Some(self.resolver.resolve_reference(reference, filter)),
            }),
            Payload::Json(fragment) => match serde_json::from_str::<Value>(fragment) {
                Ok(value) => Some(MediaContent {
                    schema: SchemaGenerator::literal_schema(&value),
                    example: Some(self.resolver.expand_inline_references(value)),
                }),
                Err(e) => {
                    error!("Malformed JSON in annotation ({}): {}", e, line);
                    None
                }
            },
            Payload::None => None,
        }
    }
}

/// `Returns **list** of **User**` / `Returns **single** instance of **User**`
fn reference_phrase(reference: &str) -> String {
    let (name, is_array) = crate::example_resolver::split_reference(reference);
    if is_array {
        format!("Returns **list** of **{}**", name)
    } else {
        format!("Returns **single** instance of **{}**", name)
    }
}

fn json_media(content: MediaContent) -> IndexMap<String, MediaContent> {
    let mut media = IndexMap::new();
    media.insert("application/json".to_string(), content);
    media
}

/// `multipart/form-data` body whose JSON argument is the properties map.
fn form_data_body(payload: &Payload, line: &str) -> Option<RequestBodySpec> {
    let Payload::Json(fragment) = payload else {
        warn!("@requestFormDataBody expects a JSON properties map: {}", line);
        return None;
    };

    let properties = serde_json::from_str::<IndexMap<String, Schema>>(fragment)
        .map_err(|e| error!("Malformed JSON in annotation ({}): {}", e, line))
        .ok()?;

    let mut content = IndexMap::new();
    content.insert(
        "multipart/form-data".to_string(),
        MediaContent {
            schema: Schema {
                properties: Some(properties),
                ..Schema::of_type("object")
            },
            example: None,
        },
    );
    Some(RequestBodySpec { content })
}

fn build_param(
    name: &str,
    location: ParameterLocation,
    description: Option<String>,
    meta: &ParamMeta,
) -> ParamDescriptor {
    let type_name = meta.type_name.clone().unwrap_or_else(|| "string".to_string());
    let example = match (&meta.example, meta.enum_values.first()) {
        (Some(example), _) => coerce_example(example, &type_name),
        (None, Some(first)) => coerce_example(first, &type_name),
        (None, None) => default_param_example(&type_name),
    };

    ParamDescriptor {
        name: name.to_string(),
        location,
        required: meta.required || location == ParameterLocation::Path,
        type_name,
        description,
        example: (!example.is_null()).then_some(example),
        enum_values: (!meta.enum_values.is_empty()).then(|| meta.enum_values.clone()),
    }
}

fn default_param_example(type_name: &str) -> Value {
    match type_name {
        "string" => json!("string"),
        "integer" | "number" => json!(1),
        "float" | "double" => json!(1.5),
        "boolean" => json!(true),
        _ => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{PropertyDescriptor, SchemaDefinition, SchemaKind};
    use pretty_assertions::assert_eq;

    fn registry() -> SchemaRegistry {
        let mut registry = SchemaRegistry::new();
        let mut user = SchemaDefinition::new("User", SchemaKind::Model);
        user.properties
            .insert("id".into(), PropertyDescriptor::primitive("number", json!(1)));
        user.properties.insert(
            "email".into(),
            PropertyDescriptor::primitive("string", json!("johndoe@example.com")),
        );
        registry.insert(user);
        registry
    }

    fn lines(text: &[&str]) -> Vec<String> {
        text.iter().map(|line| line.to_string()).collect()
    }

    #[test]
    fn test_text_directives() {
        let registry = registry();
        let options = GeneratorOptions::default();
        let parser = AnnotationParser::new(&registry, &options);
        let record = parser.parse(
            "index",
            &lines(&[
                "@summary List users",
                "@description Every user, paginated",
                "@operationId listUsers",
                "@tag Accounts",
                "some free text",
            ]),
        );
        assert_eq!(record.action, "index");
        assert_eq!(record.summary.as_deref(), Some("List users"));
        assert_eq!(record.description.as_deref(), Some("Every user, paginated"));
        assert_eq!(record.operation_id.as_deref(), Some("listUsers"));
        assert_eq!(record.tag.as_deref(), Some("Accounts"));
    }

    #[test]
    fn test_response_body_list_reference() {
        let registry = registry();
        let options = GeneratorOptions::default();
        let parser = AnnotationParser::new(&registry, &options);
        let record = parser.parse("index", &lines(&["@responseBody 200 - <User[]>"]));

        let response = &record.responses["200"];
        assert_eq!(response.description, "Returns **list** of **User**");
        let media = &response.content.as_ref().unwrap()["application/json"];
        assert_eq!(
            serde_json::to_value(&media.schema).unwrap(),
            json!({ "type": "array", "items": { "$ref": "#/components/schemas/User" } })
        );
        assert_eq!(
            media.example,
            Some(json!([{ "id": 1, "email": "johndoe@example.com" }]))
        );
    }

    #[test]
    fn test_response_description_mentions_filters() {
        let registry = registry();
        let options = GeneratorOptions::default();
        let parser = AnnotationParser::new(&registry, &options);
        let record = parser.parse("show", &lines(&["@responseBody 200 - <User>.only(id)"]));

        let response = &record.responses["200"];
        assert_eq!(
            response.description,
            "Returns **single** instance of **User** (only: id)"
        );
        let media = &response.content.as_ref().unwrap()["application/json"];
        assert_eq!(media.example, Some(json!({ "id": 1 })));
    }

    #[test]
    fn test_json_response_with_nested_reference() {
        let registry = registry();
        let options = GeneratorOptions::default();
        let parser = AnnotationParser::new(&registry, &options);
        let record = parser.parse(
            "index",
            &lines(&[r#"@responseBody 200 - {"data": "<User[]>.only(email)", "total": 1}"#]),
        );

        let response = &record.responses["200"];
        assert_eq!(response.description, "Returns **200** (OK)");
        let media = &response.content.as_ref().unwrap()["application/json"];
        assert_eq!(media.schema.schema_type, Some("object".to_string()));
        assert_eq!(
            media.example,
            Some(json!({ "data": [{ "email": "johndoe@example.com" }], "total": 1 }))
        );
    }

    #[test]
    fn test_malformed_json_is_omitted() {
        let registry = registry();
        let options = GeneratorOptions::default();
        let parser = AnnotationParser::new(&registry, &options);
        let record = parser.parse(
            "index",
            &lines(&[
                r#"@responseBody 200 - Broken - {"data": }"#,
                "@summary Still parsed",
            ]),
        );
        let response = &record.responses["200"];
        assert_eq!(response.description, "Broken");
        assert!(response.content.is_none());
        assert_eq!(record.summary.as_deref(), Some("Still parsed"));
    }

    #[test]
    fn test_response_headers_and_groups() {
        let registry = registry();
        let mut options = GeneratorOptions::default();
        let mut first = IndexMap::new();
        first.insert(
            "X-Total".to_string(),
            HeaderSpec { description: "first".to_string(), schema: Schema::of_type("integer") },
        );
        first.insert(
            "X-Page".to_string(),
            HeaderSpec { description: "page".to_string(), schema: Schema::of_type("integer") },
        );
        let mut second = IndexMap::new();
        second.insert(
            "X-Total".to_string(),
            HeaderSpec { description: "second".to_string(), schema: Schema::of_type("integer") },
        );
        options.common_headers.insert("paginated".to_string(), first);
        options.common_headers.insert("counted".to_string(), second);

        let parser = AnnotationParser::new(&registry, &options);
        let record = parser.parse(
            "index",
            &lines(&[
                "@responseHeader 200 - @use(paginated, counted, missing)",
                "@responseHeader 200 - X-Trace - Trace id - @example(abc)",
                "@responseHeader 200",
                "@responseBody 200 - <User[]>",
            ]),
        );

        let response = &record.responses["200"];
        assert_eq!(response.headers["X-Total"].description, "second");
        assert_eq!(response.headers["X-Page"].description, "page");
        assert_eq!(response.headers["X-Trace"].schema.example, Some(json!("abc")));
        assert_eq!(response.headers.len(), 3);
        // the body directive keeps the headers declared before it
        assert!(response.content.is_some());
    }

    #[test]
    fn test_header_without_response_creates_default() {
        let registry = registry();
        let options = GeneratorOptions::default();
        let parser = AnnotationParser::new(&registry, &options);
        let record = parser.parse("index", &lines(&["@responseHeader 201 - Location - New url"]));
        let response = &record.responses["201"];
        assert_eq!(response.description, "Returns **201** (Created)");
        assert_eq!(response.headers["Location"].description, "New url");
    }

    #[test]
    fn test_request_bodies() {
        let registry = registry();
        let options = GeneratorOptions::default();
        let parser = AnnotationParser::new(&registry, &options);

        let record = parser.parse("store", &lines(&["@requestBody <User>.exclude(id)"]));
        let media = &record.request_body.unwrap().content["application/json"];
        assert_eq!(media.schema.reference, Some("#/components/schemas/User".to_string()));
        assert_eq!(media.example, Some(json!({ "email": "johndoe@example.com" })));

        let record = parser.parse("store", &lines(&[r#"@requestBody {"name": "John"}"#]));
        let media = &record.request_body.unwrap().content["application/json"];
        assert_eq!(media.example, Some(json!({ "name": "John" })));

        let record = parser.parse(
            "upload",
            &lines(&[r#"@requestFormDataBody {"file": {"type": "string", "format": "binary"}}"#]),
        );
        let body = record.request_body.unwrap();
        let media = &body.content["multipart/form-data"];
        let properties = media.schema.properties.as_ref().unwrap();
        assert_eq!(properties["file"].format, Some("binary".to_string()));
        assert!(media.example.is_none());
    }

    #[test]
    fn test_parameters() {
        let registry = registry();
        let mut options = GeneratorOptions::default();
        options.common_parameters.insert(
            "sortable".to_string(),
            vec![ParamDescriptor::new("sortBy", ParameterLocation::Query, false)],
        );
        let parser = AnnotationParser::new(&registry, &options);
        let record = parser.parse(
            "index",
            &lines(&[
                "@paramPath id - The user id - @type(integer)",
                "@paramQuery page - Page number - @type(integer) @example(3)",
                "@paramQuery order - @enum(asc, desc)",
                "@paramQuery ratio - @type(float)",
                "@paramHeader X-Tenant - Tenant - @required",
                "@paramUse(sortable)",
            ]),
        );

        let names: Vec<&str> = record.parameters.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["id", "page", "order", "ratio", "X-Tenant", "sortBy"]);

        let id = &record.parameters["id"];
        assert!(id.required);
        assert_eq!(id.example, Some(json!(1)));
        assert_eq!(id.description.as_deref(), Some("The user id"));

        let page = &record.parameters["page"];
        assert!(!page.required);
        assert_eq!(page.example, Some(json!(3)));

        let order = &record.parameters["order"];
        assert_eq!(order.example, Some(json!("asc")));
        assert_eq!(order.enum_values, Some(vec!["asc".to_string(), "desc".to_string()]));

        assert_eq!(record.parameters["ratio"].example, Some(json!(1.5)));

        let tenant = &record.parameters["X-Tenant"];
        assert_eq!(tenant.location, ParameterLocation::Header);
        assert!(tenant.required);
        assert_eq!(tenant.example, Some(json!("string")));
    }

    #[test]
    fn test_enum_example_follows_type() {
        let registry = registry();
        let options = GeneratorOptions::default();
        let parser = AnnotationParser::new(&registry, &options);
        let record = parser.parse(
            "index",
            &lines(&[
                "@paramQuery limit - @type(integer) @enum(10, 25)",
                "@paramQuery verbose - @type(boolean) @enum(false, true)",
            ]),
        );

        assert_eq!(record.parameters["limit"].example, Some(json!(10)));
        assert_eq!(
            record.parameters["limit"].enum_values,
            Some(vec!["10".to_string(), "25".to_string()])
        );
        assert_eq!(record.parameters["verbose"].example, Some(json!(false)));
    }

    #[test]
    fn test_default_description() {
        assert_eq!(default_description("404"), "Returns **404** (Not Found)");
        assert_eq!(default_description("299"), "Returns **299**");
    }
}
