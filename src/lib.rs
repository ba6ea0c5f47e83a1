//! autoswagger - OpenAPI documents from AdonisJS route lists and annotated sources.
//!
//! The generator reads the framework's route list, the data models and
//! interfaces of a project, and the structured comments on controller
//! actions, then assembles an OpenAPI 3.0 document with concrete examples.
//! Nothing is compiled or executed: sources are read as text.
//!
//! # Architecture
//!
//! 1. [`extractor`] - Normalizes both route-list shapes into route descriptors
//! 2. [`scanner`] - Supplies model, interface and controller sources
//! 3. [`schema`] - Parses models and interfaces into the schema registry
//! 4. [`example_resolver`] - Expands schema references into example payloads
//! 5. [`annotation`] - Parses controller comment blocks, once per file per run
//! 6. [`schema_generator`] - Converts registry entries and types to OpenAPI schemas
//! 7. [`openapi_builder`] - Assembles the complete document
//! 8. [`serializer`] - Serializes the document to YAML or JSON
//!
//! [`brackets`] holds the token helpers shared by the parsers, [`config`] the
//! generator options and [`error`] the failures that abort a run.
//!
//! # Example Usage
//!
//! ```no_run
//! use autoswagger::{cli, config::GeneratorOptions, extractor, serializer};
//! use std::path::Path;
//!
//! let options = GeneratorOptions::default();
//! let entries = extractor::load_route_list(Path::new("./my-app/routes.json")).unwrap();
//! let document = cli::generate(Path::new("./my-app"), &entries, &options).unwrap();
//! println!("{}", serializer::serialize_yaml(&document).unwrap());
//! ```
//!
//! # Command-Line Interface
//!
//! For command-line usage, see the [`cli`] module.

pub mod annotation;
pub mod brackets;
pub mod cli;
pub mod config;
pub mod error;
pub mod example_resolver;
pub mod extractor;
pub mod openapi_builder;
pub mod scanner;
pub mod schema;
pub mod schema_generator;
pub mod serializer;
