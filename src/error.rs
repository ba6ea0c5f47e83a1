use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, Error>;

/// Failures that abort a generation run.
///
/// Authoring mistakes inside annotations or schema sources never surface
/// here; they are logged and the affected piece is omitted.
#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot read source file {}: {source}", path.display())]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid route list {}: {message}", path.display())]
    RouteList { path: PathBuf, message: String },

    #[error("invalid configuration {}: {message}", path.display())]
    Config { path: PathBuf, message: String },
}
