use crate::annotation::controller::AnnotationCache;
use crate::annotation::AnnotationParser;
use crate::config::GeneratorOptions;
use crate::extractor::{extract_routes, load_route_list, RouteEntry};
use crate::openapi_builder::{assemble, OpenApiDocument};
use crate::scanner::{FsSourceProvider, SourceProvider};
use crate::schema::examples::ExampleGenerator;
use crate::schema::registry::SchemaRegistry;
use crate::serializer::{serialize_json, serialize_yaml, write_to_file};
use anyhow::Result;
use clap::{Parser, ValueEnum};
use log::{debug, info};
use std::path::{Path, PathBuf};

/// AdonisJS autoswagger - generate an OpenAPI document from routes, models and controller annotations
#[derive(Parser, Debug)]
#[command(name = "autoswagger")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to the AdonisJS project directory
    #[arg(value_name = "PROJECT_PATH")]
    pub project_path: PathBuf,

    /// Route list exported by the framework, as JSON
    #[arg(value_name = "ROUTES_FILE")]
    pub routes_path: PathBuf,

    /// Generator options file (YAML or JSON)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config_path: Option<PathBuf>,

    /// Output format (yaml or json)
    #[arg(short = 'f', long = "format", value_enum, default_value = "yaml")]
    pub output_format: OutputFormat,

    /// Output file path (if not specified, outputs to stdout)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output_path: Option<PathBuf>,

    /// Document title, overriding the options file
    #[arg(long = "title")]
    pub title: Option<String>,

    /// Document version, overriding the options file
    #[arg(long = "version-string", value_name = "VERSION")]
    pub version_string: Option<String>,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Output format options
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// YAML format
    Yaml,
    /// JSON format
    Json,
}

/// Parse command line arguments
pub fn parse_args() -> Result<CliArgs> {
    let args = CliArgs::parse();
    parse_args_from_parsed(args)
}

/// Validate and log already-parsed arguments
pub fn parse_args_from_parsed(args: CliArgs) -> Result<CliArgs> {
    debug!("Parsed arguments: {:?}", args);

    if !args.project_path.is_dir() {
        anyhow::bail!(
            "Project path is not a directory: {}",
            args.project_path.display()
        );
    }

    info!("Project path: {}", args.project_path.display());
    info!("Route list: {}", args.routes_path.display());
    info!("Output format: {:?}", args.output_format);
    match &args.output_path {
        Some(output) => info!("Output file: {}", output.display()),
        None => info!("Output: stdout"),
    }

    Ok(args)
}

/// Options from the config file (or defaults) with the CLI overrides applied
pub fn load_options(args: &CliArgs) -> Result<GeneratorOptions> {
    let mut options = match &args.config_path {
        Some(path) => GeneratorOptions::from_file(path)?,
        None => GeneratorOptions::default(),
    };
    if let Some(title) = &args.title {
        options.title = title.clone();
    }
    if let Some(version) = &args.version_string {
        options.version = version.clone();
    }
    Ok(options)
}

/// Generates the document for a project on disk.
///
/// Fails when a model, interface or controller source cannot be read.
pub fn generate(
    project_path: &Path,
    entries: &[RouteEntry],
    options: &GeneratorOptions,
) -> Result<OpenApiDocument> {
    let provider = FsSourceProvider::new(
        project_path.to_path_buf(),
        &options.models_path,
        &options.interfaces_path,
    );

    info!("Reading schema sources...");
    let interfaces = provider.interface_sources()?;
    let models = provider.model_sources()?;
    let mut examples = ExampleGenerator::new(options.example_seed);
    let registry = SchemaRegistry::build(&interfaces, &models, options.snake_case, &mut examples);
    info!(
        "Registered {} schemas from {} interface and {} model files",
        registry.len(),
        interfaces.len(),
        models.len()
    );

    let routes = extract_routes(entries, options);
    info!("Normalized {} routes", routes.len());

    let parser = AnnotationParser::new(&registry, options);
    let mut cache = AnnotationCache::new(&provider, parser);
    let document = assemble(&routes, &mut cache, &registry, options)?;
    info!("Parsed {} controller files", cache.parsed_files());

    Ok(document)
}

/// Run the main workflow
pub fn run(args: CliArgs) -> Result<()> {
    info!("Starting OpenAPI document generation...");

    let options = load_options(&args)?;
    let entries = load_route_list(&args.routes_path)?;
    let document = generate(&args.project_path, &entries, &options)?;

    info!("Serializing to {:?} format...", args.output_format);
    let content = match args.output_format {
        OutputFormat::Yaml => serialize_yaml(&document)?,
        OutputFormat::Json => serialize_json(&document)?,
    };

    if let Some(output_path) = &args.output_path {
        info!("Writing output to: {}", output_path.display());
        write_to_file(&content, output_path)?;
        info!("Successfully wrote OpenAPI document to {}", output_path.display());
    } else {
        println!("{}", content);
    }

    info!("Generation complete!");
    info!("Summary:");
    info!("  - Route entries: {}", entries.len());
    info!("  - Paths documented: {}", document.paths.len());
    info!("  - Schemas: {}", document.components.schemas.len());
    info!("  - Tags: {}", document.tags.len());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn args_for(project: &Path, extra: &[&str]) -> CliArgs {
        let mut argv = vec![
            "autoswagger".to_string(),
            project.display().to_string(),
            project.join("routes.json").display().to_string(),
        ];
        argv.extend(extra.iter().map(|arg| arg.to_string()));
        CliArgs::parse_from(argv)
    }

    #[test]
    fn test_parse_arguments() {
        let temp_dir = TempDir::new().unwrap();
        let args = args_for(temp_dir.path(), &["-f", "json", "-o", "out.json", "--title", "Shop"]);
        assert!(matches!(args.output_format, OutputFormat::Json));
        assert_eq!(args.output_path, Some(PathBuf::from("out.json")));
        assert_eq!(args.title.as_deref(), Some("Shop"));
        assert!(!args.verbose);
        assert!(parse_args_from_parsed(args).is_ok());
    }

    #[test]
    fn test_project_path_must_be_directory() {
        let temp_dir = TempDir::new().unwrap();
        let args = args_for(&temp_dir.path().join("missing"), &[]);
        assert!(parse_args_from_parsed(args).is_err());
    }

    #[test]
    fn test_cli_overrides_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let config = temp_dir.path().join("autoswagger.yml");
        fs::write(&config, "title: From file\nversion: 2.0.0\ntagIndex: 1\n").unwrap();

        let config_arg = config.display().to_string();
        let args = args_for(temp_dir.path(), &["--config", &config_arg, "--version-string", "3.1.0"]);
        let options = load_options(&args).unwrap();
        assert_eq!(options.title, "From file");
        assert_eq!(options.version, "3.1.0");
        assert_eq!(options.tag_index, 1);
    }

    #[test]
    fn test_run_writes_json_output() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(
            root.join("routes.json"),
            r#"[{"pattern": "/health", "methods": ["GET", "HEAD"], "handler": {"name": "closure"}}]"#,
        )
        .unwrap();

        let output = root.join("docs/swagger.json");
        let output_arg = output.display().to_string();
        run(args_for(root, &["-f", "json", "-o", &output_arg])).unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(parsed["info"]["title"], "AdonisJS API");
        assert!(parsed["paths"]["/health"]["get"].is_object());
        assert!(parsed["paths"]["/health"]["head"].is_null());
    }

    #[test]
    fn test_run_fails_on_missing_route_list() {
        let temp_dir = TempDir::new().unwrap();
        let err = run(args_for(temp_dir.path(), &[])).unwrap_err();
        assert!(err.to_string().contains("routes.json"));
    }
}
