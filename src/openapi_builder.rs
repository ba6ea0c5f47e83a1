use crate::annotation::controller::AnnotationCache;
use crate::annotation::{AnnotationRecord, RequestBodySpec, ResponseSpec};
use crate::config::GeneratorOptions;
use crate::extractor::{HandlerRef, HttpMethod, ParamDescriptor, RouteDescriptor};
use crate::schema::registry::SchemaRegistry;
use crate::schema_generator::{Schema, SchemaGenerator};
use anyhow::Result;
use indexmap::IndexMap;
use log::{debug, info};
use serde::Serialize;

/// Name of the bearer token security scheme.
pub const SECURITY_SCHEME: &str = "BearerAuth";

/// OpenAPI document builder
pub struct OpenApiBuilder<'a> {
    options: &'a GeneratorOptions,
    /// Paths collection (URL path -> lowercase method -> Operation)
    paths: IndexMap<String, PathItem>,
    /// Tags in order of first appearance
    tags: Vec<Tag>,
}

/// Operations of one path, keyed by lowercase method.
pub type PathItem = IndexMap<String, Operation>;

/// OpenAPI Info object
#[derive(Debug, Clone, Serialize)]
pub struct Info {
    pub title: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// OpenAPI Operation object - represents a single API operation
#[derive(Debug, Clone, Default, Serialize)]
pub struct Operation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "operationId", skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    #[serde(rename = "requestBody", skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBodySpec>,
    /// Keyed by status code
    pub responses: IndexMap<String, ResponseSpec>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub security: Vec<IndexMap<String, Vec<String>>>,
}

/// OpenAPI Parameter object
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    pub name: String,
    /// Parameter location (path, query, header)
    #[serde(rename = "in")]
    pub location: String,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub schema: Schema,
}

impl From<&ParamDescriptor> for Parameter {
    fn from(param: &ParamDescriptor) -> Self {
        let schema = Schema {
            example: param.example.clone(),
            enum_values: param.enum_values.clone(),
            ..SchemaGenerator::primitive_schema(&param.type_name)
        };
        Self {
            name: param.name.clone(),
            location: param.location.as_str().to_string(),
            required: param.required,
            description: param.description.clone(),
            schema,
        }
    }
}

/// OpenAPI Tag object
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tag {
    pub name: String,
    pub description: String,
}

/// OpenAPI security scheme object
#[derive(Debug, Clone, Serialize)]
pub struct SecurityScheme {
    #[serde(rename = "type")]
    pub scheme_type: String,
    pub scheme: String,
}

/// OpenAPI Components object
#[derive(Debug, Clone, Serialize)]
pub struct Components {
    pub schemas: IndexMap<String, Schema>,
    #[serde(rename = "securitySchemes")]
    pub security_schemes: IndexMap<String, SecurityScheme>,
    pub responses: IndexMap<String, ResponseSpec>,
}

/// Complete OpenAPI document
#[derive(Debug, Clone, Serialize)]
pub struct OpenApiDocument {
    /// OpenAPI version
    pub openapi: String,
    pub info: Info,
    pub components: Components,
    /// Keyed by `{param}` path, then by lowercase method
    pub paths: IndexMap<String, PathItem>,
    pub tags: Vec<Tag>,
}

impl<'a> OpenApiBuilder<'a> {
    pub fn new(options: &'a GeneratorOptions) -> Self {
        debug!("Initializing OpenApiBuilder");
        Self {
            options,
            paths: IndexMap::new(),
            tags: Vec::new(),
        }
    }

    /// Whether a route ends up in the document at all.
    pub fn is_documented(&self, route: &RouteDescriptor) -> bool {
        !self.options.is_ignored(&route.pattern)
    }

    /// Add a route to the OpenAPI document
    ///
    /// `record` is the annotation block of the route's controller action, if any.
    pub fn add_route(&mut self, route: &RouteDescriptor, record: Option<&AnnotationRecord>) {
        if !self.is_documented(route) {
            debug!("Skipping ignored route {}", route.pattern);
            return;
        }

        for method in self.documented_methods(route) {
            debug!("Adding route: {} {}", method, route.path);
            let operation = self.operation(route, method, record);

            for tag in &operation.tags {
                self.register_tag(tag);
            }

            let path_item = self.paths.entry(route.path.clone()).or_default();
            let key = method.as_str().to_lowercase();
            if path_item.insert(key, operation).is_some() {
                debug!("{} {} declared twice, keeping the last one", method, route.path);
            }
        }
    }

    /// Methods emitted for a route: no HEAD, and only the preferred one of PUT/PATCH.
    fn documented_methods(&self, route: &RouteDescriptor) -> Vec<HttpMethod> {
        let both = route.methods.contains(&HttpMethod::Put) && route.methods.contains(&HttpMethod::Patch);
        let preferred = self.options.preferred_put_patch;

        route
            .methods
            .iter()
            .copied()
            .filter(|method| *method != HttpMethod::Head)
            .filter(|method| {
                !both || !matches!(method, HttpMethod::Put | HttpMethod::Patch) || *method == preferred
            })
            .collect()
    }

    fn operation(
        &self,
        route: &RouteDescriptor,
        method: HttpMethod,
        record: Option<&AnnotationRecord>,
    ) -> Operation {
        let secured = route
            .middleware
            .iter()
            .any(|middleware| self.options.is_security_middleware(middleware));

        let tag = record
            .and_then(|record| record.tag.as_deref())
            .map(str::to_uppercase)
            .unwrap_or_else(|| route.tag.clone());

        let summary = record
            .and_then(|record| record.summary.clone())
            .or_else(|| crud_summary(&route.handler));

        let request_body = record
            .and_then(|record| record.request_body.clone())
            .or_else(|| {
                matches!(method, HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch)
                    .then(RequestBodySpec::empty_json)
            });

        let mut security = Vec::new();
        if secured {
            let mut requirement = IndexMap::new();
            requirement.insert(SECURITY_SCHEME.to_string(), vec!["access".to_string()]);
            security.push(requirement);
        }

        Operation {
            summary,
            description: description(&route.handler, record),
            operation_id: record.and_then(|record| record.operation_id.clone()),
            tags: if tag.is_empty() { Vec::new() } else { vec![tag] },
            parameters: merge_parameters(&route.path_parameters, record)
                .iter()
                .map(Parameter::from)
                .collect(),
            request_body,
            responses: merge_responses(method, secured, record),
            security,
        }
    }

    fn register_tag(&mut self, name: &str) {
        if self.tags.iter().any(|tag| tag.name == name) {
            return;
        }
        self.tags.push(Tag {
            name: name.to_string(),
            description: format!("Everything related to {}", name),
        });
    }

    /// Build the final OpenAPI document
    pub fn build(self, registry: &SchemaRegistry) -> OpenApiDocument {
        debug!("Building final OpenAPI document");

        let mut security_schemes = IndexMap::new();
        security_schemes.insert(
            SECURITY_SCHEME.to_string(),
            SecurityScheme {
                scheme_type: "http".to_string(),
                scheme: "bearer".to_string(),
            },
        );

        OpenApiDocument {
            openapi: "3.0.0".to_string(),
            info: Info {
                title: self.options.title.clone(),
                version: self.options.version.clone(),
                description: self.options.description.clone(),
            },
            components: Components {
                schemas: SchemaGenerator::components(registry),
                security_schemes,
                responses: shared_responses(),
            },
            paths: self.paths,
            tags: self.tags,
        }
    }
}

/// Runs the whole assembly: every route, with annotations read through `cache`.
///
/// Fails only when a controller source cannot be read.
pub fn assemble(
    routes: &[RouteDescriptor],
    cache: &mut AnnotationCache<'_>,
    registry: &SchemaRegistry,
    options: &GeneratorOptions,
) -> Result<OpenApiDocument> {
    let mut builder = OpenApiBuilder::new(options);

    for route in routes {
        if !builder.is_documented(route) {
            debug!("Skipping ignored route {}", route.pattern);
            continue;
        }
        let record = match &route.handler {
            HandlerRef::Controller { source_file, action } => cache.annotations(source_file, action)?,
            HandlerRef::Closure { .. } => None,
        };
        builder.add_route(route, record);
    }

    let document = builder.build(registry);
    info!(
        "Assembled {} paths and {} tags",
        document.paths.len(),
        document.tags.len()
    );
    Ok(document)
}

/// Path parameters overlaid with annotation parameters; annotations win by name.
fn merge_parameters(path_parameters: &[ParamDescriptor], record: Option<&AnnotationRecord>) -> Vec<ParamDescriptor> {
    let mut merged: IndexMap<String, ParamDescriptor> = path_parameters
        .iter()
        .map(|param| (param.name.clone(), param.clone()))
        .collect();

    if let Some(record) = record {
        for (name, param) in &record.parameters {
            merged.insert(name.clone(), param.clone());
        }
    }

    merged.into_values().collect()
}

/// Annotation responses plus the method default and, for secured routes, 401/403.
fn merge_responses(
    method: HttpMethod,
    secured: bool,
    record: Option<&AnnotationRecord>,
) -> IndexMap<String, ResponseSpec> {
    let mut responses = record.map(|record| record.responses.clone()).unwrap_or_default();

    let mut defaults = vec![default_status(method)];
    if secured {
        defaults.extend(["401", "403"]);
    }
    for status in defaults {
        if !responses.contains_key(status) {
            responses.insert(status.to_string(), ResponseSpec::new(status));
        }
    }
    responses
}

fn default_status(method: HttpMethod) -> &'static str {
    match method {
        HttpMethod::Post => "201",
        HttpMethod::Delete => "202",
        HttpMethod::Put | HttpMethod::Patch => "204",
        _ => "200",
    }
}

/// Summary for conventional CRUD action names.
fn crud_summary(handler: &HandlerRef) -> Option<String> {
    let HandlerRef::Controller { source_file, action } = handler else {
        return None;
    };
    let subject = controller_subject(source_file);
    let summary = match action.as_str() {
        "index" => format!("Get a list of {}", subject),
        "show" => format!("Get a single instance of {}", subject),
        "store" => format!("Create {}", subject),
        "update" => format!("Update {}", subject),
        "destroy" => format!("Delete {}", subject),
        _ => return None,
    };
    Some(summary)
}

/// `app/controllers/blog_posts_controller` -> `blog posts`
fn controller_subject(source_file: &str) -> String {
    let stem = source_file.rsplit('/').next().unwrap_or(source_file);
    let stem = stem
        .strip_suffix("_controller")
        .or_else(|| stem.strip_suffix("Controller"))
        .unwrap_or(stem);
    crate::schema::to_snake_case(stem).replace('_', " ")
}

/// Authored description followed by the `_<file>_ - **<action>**` footer.
fn description(handler: &HandlerRef, record: Option<&AnnotationRecord>) -> Option<String> {
    let authored = record.and_then(|record| record.description.clone());
    match handler {
        HandlerRef::Controller { source_file, action } => {
            let footer = format!("_{}_ - **{}**", source_file, action);
            Some(match authored {
                Some(text) => format!("{}\n\n{}", text, footer),
                None => footer,
            })
        }
        HandlerRef::Closure { .. } => authored,
    }
}

fn shared_responses() -> IndexMap<String, ResponseSpec> {
    [
        ("Forbidden", "403", "Access denied"),
        ("Accepted", "202", "Request accepted"),
        ("Created", "201", "Resource created"),
        ("NotFound", "404", "Resource not found"),
        ("NotAcceptable", "406", "Request not acceptable"),
    ]
    .into_iter()
    .map(|(name, status, description)| {
        let response = ResponseSpec {
            description: description.to_string(),
            ..ResponseSpec::new(status)
        };
        (name.to_string(), response)
    })
    .collect()
}
