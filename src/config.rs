//! Generator options.
//!
//! Options are read from a YAML or JSON file with camelCase keys; every key
//! is optional and falls back to the defaults below.
//!
//! ```yaml
//! title: Shop API
//! version: 2.0.0
//! tagIndex: 2
//! preferredPutPatch: PATCH
//! ignore: ["/swagger", "/docs", "/_debug*"]
//! commonHeaders:
//!   paginated:
//!     X-Total-Pages:
//!       description: Total amount of pages
//!       schema: { type: integer, example: 5 }
//! commonParameters:
//!   sortable:
//!     - { name: sortBy, in: query, example: name }
//! ```

use crate::annotation::HeaderSpec;
use crate::error::{Error, Result};
use crate::extractor::{HttpMethod, ParamDescriptor};
use crate::example_resolver::DEFAULT_MAX_DEPTH;
use indexmap::IndexMap;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Options of one generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneratorOptions {
    pub title: String,
    pub version: String,
    pub description: Option<String>,
    /// Route patterns to skip; a trailing `*` matches any suffix
    #[serde(alias = "ignorePatterns")]
    pub ignore: Vec<String>,
    /// Path segment used as the route tag
    pub tag_index: usize,
    /// Convert model field names to snake_case
    pub snake_case: bool,
    /// Which of PUT/PATCH is documented when a route declares both
    pub preferred_put_patch: HttpMethod,
    /// Header groups available to `@responseHeader ... @use(group)`
    pub common_headers: IndexMap<String, IndexMap<String, HeaderSpec>>,
    /// Parameter groups available to `@paramUse(group)`
    pub common_parameters: IndexMap<String, Vec<ParamDescriptor>>,
    /// Passed through to documentation viewers
    pub persist_authorization: bool,
    pub max_example_depth: usize,
    /// Middleware marking a route as secured; `auth` also matches `auth:api`
    pub security_middleware: Vec<String>,
    /// Import specifier prefixes and the source directories they stand for
    pub import_aliases: IndexMap<String, String>,
    pub models_path: String,
    pub interfaces_path: String,
    /// Seed for pseudo-random numeric examples
    pub example_seed: Option<u64>,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        let mut import_aliases = IndexMap::new();
        import_aliases.insert("#controllers".to_string(), "app/controllers".to_string());

        Self {
            title: "AdonisJS API".to_string(),
            version: "1.0.0".to_string(),
            description: None,
            ignore: vec!["/swagger".to_string(), "/docs".to_string()],
            tag_index: 2,
            snake_case: true,
            preferred_put_patch: HttpMethod::Put,
            common_headers: IndexMap::new(),
            common_parameters: IndexMap::new(),
            persist_authorization: false,
            max_example_depth: DEFAULT_MAX_DEPTH,
            security_middleware: vec!["auth".to_string()],
            import_aliases,
            models_path: "app/models".to_string(),
            interfaces_path: "app/interfaces".to_string(),
            example_seed: None,
        }
    }
}

impl GeneratorOptions {
    /// Loads options from a YAML or JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        info!("Loading configuration from {}", path.display());
        let text = fs::read_to_string(path).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::parse(&text, path)
    }

    /// Parses options text; `path` only names the source in errors.
    pub fn parse(text: &str, path: &Path) -> Result<Self> {
        let config_error = |message: String| Error::Config {
            path: path.to_path_buf(),
            message,
        };

        // an empty file is a valid, all-default configuration
        let options: Self = if text.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(text).map_err(|e| config_error(e.to_string()))?
        };

        if !matches!(options.preferred_put_patch, HttpMethod::Put | HttpMethod::Patch) {
            return Err(config_error(format!(
                "preferredPutPatch must be PUT or PATCH, got {}",
                options.preferred_put_patch
            )));
        }

        debug!("Loaded options: {:?}", options);
        Ok(options)
    }

    /// Whether a route pattern matches one of the ignore patterns.
    pub fn is_ignored(&self, pattern: &str) -> bool {
        self.ignore.iter().any(|ignored| match ignored.strip_suffix('*') {
            Some(prefix) => pattern.starts_with(prefix),
            None => pattern == ignored,
        })
    }

    /// Whether a middleware name marks its route as secured.
    pub fn is_security_middleware(&self, middleware: &str) -> bool {
        self.security_middleware.iter().any(|secured| {
            middleware == secured
                || middleware
                    .strip_prefix(secured.as_str())
                    .is_some_and(|rest| rest.starts_with(':'))
        })
    }
}
