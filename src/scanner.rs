use crate::error::Error;
use crate::schema::SourceBlob;
use anyhow::Result;
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Extensions of source files read from a project.
const SOURCE_EXTENSIONS: &[&str] = &["ts", "js"];

/// Supplies raw source text to the generator.
///
/// Controllers are requested one by one by logical path (e.g.
/// `app/controllers/users_controller`, without extension); models and
/// interfaces are requested as whole directories.
pub trait SourceProvider {
    /// Text of one controller file. Failing to read it aborts the run.
    fn read_controller(&self, logical_path: &str) -> Result<String>;

    fn model_sources(&self) -> Result<Vec<SourceBlob>>;

    fn interface_sources(&self) -> Result<Vec<SourceBlob>>;
}

/// Reads sources from a project directory on disk.
///
/// # Example
///
/// ```no_run
/// use autoswagger::scanner::{FsSourceProvider, SourceProvider};
/// use std::path::PathBuf;
///
/// let provider = FsSourceProvider::new(PathBuf::from("./my-app"), "app/models", "app/interfaces");
/// let models = provider.model_sources().unwrap();
/// println!("Found {} model files", models.len());
/// ```
pub struct FsSourceProvider {
    root_path: PathBuf,
    models_path: String,
    interfaces_path: String,
}

impl FsSourceProvider {
    pub fn new(root_path: PathBuf, models_path: &str, interfaces_path: &str) -> Self {
        Self {
            root_path,
            models_path: models_path.to_string(),
            interfaces_path: interfaces_path.to_string(),
        }
    }

    /// Reads every source file under `relative`, sorted by path.
    ///
    /// A missing directory yields no sources. Hidden directories and
    /// `node_modules` are skipped.
    fn scan(&self, relative: &str) -> Result<Vec<SourceBlob>> {
        let dir = self.root_path.join(relative);
        if !dir.is_dir() {
            warn!("Source directory {} does not exist, skipping", dir.display());
            return Ok(Vec::new());
        }

        let mut blobs = Vec::new();
        for entry in WalkDir::new(&dir)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                // Don't filter the root directory itself
                if e.path() == dir {
                    return true;
                }
                let file_name = e.file_name().to_string_lossy();
                !file_name.starts_with('.') && file_name != "node_modules"
            })
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Failed to access path: {}", e);
                    continue;
                }
            };

            let path = entry.path();
            if !path.is_file() || !is_source_file(path) {
                continue;
            }

            let text = read_source(path)?;
            let logical = path
                .strip_prefix(&self.root_path)
                .unwrap_or(path)
                .to_string_lossy()
                .replace('\\', "/");
            debug!("Read source {}", logical);
            blobs.push(SourceBlob::new(logical, text));
        }

        Ok(blobs)
    }
}

impl SourceProvider for FsSourceProvider {
    fn read_controller(&self, logical_path: &str) -> Result<String> {
        let candidates: Vec<PathBuf> = SOURCE_EXTENSIONS
            .iter()
            .map(|ext| self.root_path.join(format!("{}.{}", logical_path, ext)))
            .collect();

        // the first candidate is the one reported when nothing exists
        let path = candidates
            .iter()
            .find(|candidate| candidate.is_file())
            .unwrap_or(&candidates[0]);
        debug!("Reading controller {}", path.display());
        read_source(path)
    }

    fn model_sources(&self) -> Result<Vec<SourceBlob>> {
        self.scan(&self.models_path)
    }

    fn interface_sources(&self) -> Result<Vec<SourceBlob>> {
        self.scan(&self.interfaces_path)
    }
}

fn is_source_file(path: &Path) -> bool {
    let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
    !name.ends_with(".d.ts")
        && path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext))
}

fn read_source(path: &Path) -> Result<String> {
    let text = fs::read_to_string(path).map_err(|source| Error::SourceUnreadable {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(text)
}
