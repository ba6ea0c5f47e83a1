//! autoswagger - command-line tool for generating OpenAPI documents from AdonisJS projects.
//!
//! # Usage
//!
//! ```bash
//! autoswagger [OPTIONS] <PROJECT_PATH> <ROUTES_FILE>
//! ```
//!
//! The route list is the framework's JSON route export
//! (`node ace list:routes --json > routes.json`).
//!
//! # Examples
//!
//! Generate YAML documentation:
//! ```bash
//! autoswagger ./my-app routes.json -o swagger.yml
//! ```
//!
//! Generate JSON documentation with an options file:
//! ```bash
//! autoswagger ./my-app routes.json -c autoswagger.yml -f json -o swagger.json
//! ```

use anyhow::Result;
use autoswagger::cli;
use clap::Parser;
use log::info;

fn main() -> Result<()> {
    // Parse first so the verbose flag can pick the log level
    let args_for_verbose = cli::CliArgs::parse();

    let log_level = if args_for_verbose.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    info!("autoswagger starting...");

    let args = cli::parse_args_from_parsed(args_for_verbose)?;

    cli::run(args)?;

    info!("OpenAPI document generation completed successfully");

    Ok(())
}
