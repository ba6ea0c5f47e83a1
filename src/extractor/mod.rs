//! Route normalization for framework route lists.
//!
//! The framework exports its routes in one of two historical JSON shapes. Each
//! shape has its own extractor that turns an entry into the same
//! [`RouteDescriptor`]:
//!
//! - **Legacy**: See [`legacy::LegacyRoute`] (resolved handler with separate
//!   namespace and method fields, middleware as plain strings)
//! - **Modern**: See [`modern::ModernRoute`] (dotted handler string or lazy
//!   import tuple, middleware as named functions or closures)
//!
//! # Example
//!
//! ```no_run
//! use autoswagger::config::GeneratorOptions;
//! use autoswagger::extractor::{extract_routes, RouteEntry};
//!
//! let json = r##"[{"pattern": "/users/:id", "methods": ["GET"],
//!                 "handler": {"reference": "#controllers/users_controller.show"}}]"##;
//! let entries: Vec<RouteEntry> = serde_json::from_str(json).unwrap();
//! let routes = extract_routes(&entries, &GeneratorOptions::default());
//! println!("Found {} routes", routes.len());
//! ```

pub mod legacy;
pub mod modern;

use crate::config::GeneratorOptions;
use crate::error::Error;
use indexmap::IndexMap;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::Path;

/// Trait for normalizing one route-list entry shape.
pub trait RouteExtractor {
    /// Builds the canonical descriptor for this entry.
    ///
    /// Returns `None` when the entry carries no usable method.
    fn extract_route(&self, options: &GeneratorOptions) -> Option<RouteDescriptor>;
}

/// One entry of the framework route list, in either historical shape.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RouteEntry {
    Legacy(legacy::LegacyRoute),
    Modern(modern::ModernRoute),
}

impl RouteExtractor for RouteEntry {
    fn extract_route(&self, options: &GeneratorOptions) -> Option<RouteDescriptor> {
        match self {
            RouteEntry::Legacy(route) => route.extract_route(options),
            RouteEntry::Modern(route) => route.extract_route(options),
        }
    }
}

/// A route list file: a flat array, or arrays grouped by domain.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RouteList {
    Flat(Vec<RouteEntry>),
    ByDomain(IndexMap<String, Vec<RouteEntry>>),
}

/// Reads a route list exported by the framework.
///
/// Domain groups are flattened in file order.
pub fn load_route_list(path: &Path) -> crate::error::Result<Vec<RouteEntry>> {
    let text = fs::read_to_string(path).map_err(|e| Error::RouteList {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let entries = parse_route_list(&text).map_err(|message| Error::RouteList {
        path: path.to_path_buf(),
        message,
    })?;
    info!("Loaded {} route entries from {}", entries.len(), path.display());
    Ok(entries)
}

fn parse_route_list(text: &str) -> Result<Vec<RouteEntry>, String> {
    let list: RouteList = serde_json::from_str(text).map_err(|e| e.to_string())?;
    Ok(match list {
        RouteList::Flat(entries) => entries,
        RouteList::ByDomain(domains) => domains.into_values().flatten().collect(),
    })
}

/// Normalizes every entry, keeping the route-list order.
pub fn extract_routes(entries: &[RouteEntry], options: &GeneratorOptions) -> Vec<RouteDescriptor> {
    let routes: Vec<RouteDescriptor> = entries
        .iter()
        .filter_map(|entry| entry.extract_route(options))
        .collect();
    debug!("Normalized {} of {} route entries", routes.len(), entries.len());
    routes
}

/// Canonical, framework-independent description of one route.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteDescriptor {
    /// Methods in processing order
    pub methods: BTreeSet<HttpMethod>,
    /// The pattern as declared (e.g. "/users/:id")
    pub pattern: String,
    /// The pattern with `{param}` placeholders (e.g. "/users/{id}")
    pub path: String,
    pub path_parameters: Vec<ParamDescriptor>,
    pub middleware: Vec<String>,
    pub handler: HandlerRef,
    /// Auto-derived tag, upper-cased; empty when the path has no usable segment
    pub tag: String,
}

impl RouteDescriptor {
    /// Builds a descriptor from the parts every route shape provides.
    pub fn new(
        pattern: &str,
        methods: &[String],
        middleware: Vec<String>,
        handler: HandlerRef,
        tag_index: usize,
    ) -> Self {
        let pattern = if pattern.is_empty() { "/" } else { pattern };
        let (path, path_parameters) = parse_pattern(pattern);
        Self {
            methods: parse_methods(methods, pattern),
            pattern: pattern.to_string(),
            path,
            path_parameters,
            middleware,
            tag: tag_for(pattern, tag_index),
            handler,
        }
    }
}

/// What handles a route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerRef {
    /// A controller action; `source_file` is the logical path without extension
    Controller { source_file: String, action: String },
    /// An inline closure or function without a controller file
    Closure { name: String },
}

impl HandlerRef {
    pub fn closure() -> Self {
        HandlerRef::Closure {
            name: "closure".to_string(),
        }
    }
}

/// HTTP methods supported by the route list.
///
/// The declaration order is the order methods are processed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Options,
    Head,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
        }
    }
}

impl TryFrom<&str> for HttpMethod {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            "OPTIONS" => Ok(HttpMethod::Options),
            "HEAD" => Ok(HttpMethod::Head),
            _ => Err(format!("unknown HTTP method: {}", value)),
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The location of a parameter in an HTTP request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
}

impl ParameterLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterLocation::Path => "path",
            ParameterLocation::Query => "query",
            ParameterLocation::Header => "header",
        }
    }
}

/// One request parameter, from the path pattern or from `@param*` annotations.
///
/// Also the shape of entries in the `commonParameters` option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamDescriptor {
    pub name: String,
    #[serde(rename = "in")]
    pub location: ParameterLocation,
    #[serde(default)]
    pub required: bool,
    #[serde(rename = "type", default = "default_param_type")]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
}

fn default_param_type() -> String {
    "string".to_string()
}

impl ParamDescriptor {
    pub fn new(name: &str, location: ParameterLocation, required: bool) -> Self {
        Self {
            name: name.to_string(),
            location,
            required,
            type_name: default_param_type(),
            description: None,
            example: None,
            enum_values: None,
        }
    }
}

/// Rewrites `:param` segments to `{param}` and collects them as path parameters.
///
/// A trailing `?` marks the parameter optional.
pub fn parse_pattern(pattern: &str) -> (String, Vec<ParamDescriptor>) {
    let mut parameters = Vec::new();
    let segments: Vec<String> = pattern
        .split('/')
        .map(|segment| match segment.strip_prefix(':') {
            Some(name) => {
                let (name, required) = match name.strip_suffix('?') {
                    Some(optional) => (optional, false),
                    None => (name, true),
                };
                parameters.push(ParamDescriptor::new(name, ParameterLocation::Path, required));
                format!("{{{}}}", name)
            }
            None => segment.to_string(),
        })
        .collect();

    let path = segments.join("/");
    let path = if path.is_empty() { "/".to_string() } else { path };
    (path, parameters)
}

/// The segment at `tag_index` upper-cased, or the first plain segment when that one is a parameter.
pub fn tag_for(pattern: &str, tag_index: usize) -> String {
    let segments: Vec<&str> = pattern.split('/').collect();
    let is_plain = |segment: &str| !segment.is_empty() && !segment.starts_with(':');

    segments
        .get(tag_index)
        .copied()
        .filter(|segment| is_plain(*segment))
        .or_else(|| segments.iter().copied().find(|segment| is_plain(*segment)))
        .map(str::to_uppercase)
        .unwrap_or_default()
}

fn parse_methods(methods: &[String], pattern: &str) -> BTreeSet<HttpMethod> {
    methods
        .iter()
        .filter_map(|method| match HttpMethod::try_from(method.as_str()) {
            Ok(method) => Some(method),
            Err(e) => {
                warn!("Ignoring method of route {}: {}", pattern, e);
                None
            }
        })
        .collect()
}

/// Maps an import specifier such as `#controllers/users_controller` to its source path.
pub(crate) fn resolve_module(specifier: &str, options: &GeneratorOptions) -> String {
    let specifier = specifier.trim();
    for (alias, target) in &options.import_aliases {
        if let Some(rest) = specifier.strip_prefix(alias.as_str()) {
            return format!("{}{}", target.trim_end_matches('/'), rest);
        }
    }
    specifier.trim_start_matches("./").to_string()
}
