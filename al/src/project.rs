//! Project discovery and paths
//!
//! An airlift project is any directory containing `airlift.yml`. All
//! derived paths (run bin, history database) hang off the project root.

use std::env;
use std::path::{Path, PathBuf};

use eyre::{Result, eyre};
use tracing::debug;

/// Name of the project file that marks a project root
pub const PROJECT_FILE: &str = "airlift.yml";

/// Environment variable overriding project root discovery
pub const PROJECT_ROOT_ENV: &str = "AIRLIFT_PROJECT_ROOT";

/// Environment variable holding the history database URI
pub const DATABASE_URI_ENV: &str = "AIRLIFT_DATABASE_URI";

/// Placeholder substituted with the project root in the database URI
pub const PROJECT_ROOT_PLACEHOLDER: &str = "$AIRLIFT_PROJECT_ROOT";

/// Default database URI, relative to the project root
pub const DEFAULT_DATABASE_URI: &str = "sqlite:///$AIRLIFT_PROJECT_ROOT/.airlift/airlift.db";

/// A located airlift project
#[derive(Debug, Clone)]
pub struct Project {
    root: PathBuf,
}

impl Project {
    /// Locate the project: env override first, then walk up from cwd
    /// until a directory containing the project file is found.
    pub fn find() -> Result<Self> {
        if let Ok(root) = env::var(PROJECT_ROOT_ENV) {
            let root = PathBuf::from(root);
            if !root.join(PROJECT_FILE).exists() {
                return Err(eyre!(
                    "{} points at {} but no {} found there",
                    PROJECT_ROOT_ENV,
                    root.display(),
                    PROJECT_FILE
                ));
            }
            debug!(?root, "Project root from environment");
            return Ok(Self { root });
        }

        let cwd = env::current_dir()?;
        let mut dir: &Path = &cwd;
        loop {
            if dir.join(PROJECT_FILE).exists() {
                debug!(root = ?dir, "Project root found");
                return Ok(Self { root: dir.to_path_buf() });
            }
            match dir.parent() {
                Some(parent) => dir = parent,
                None => {
                    return Err(eyre!(
                        "No {} found in {} or any parent directory",
                        PROJECT_FILE,
                        cwd.display()
                    ));
                }
            }
        }
    }

    /// Use an explicit root without discovery (tests, --project flag)
    pub fn at(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.join(PROJECT_FILE).exists() {
            return Err(eyre!("No {} found in {}", PROJECT_FILE, root.display()));
        }
        Ok(Self { root })
    }

    /// Project root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path to the project file
    pub fn file_path(&self) -> PathBuf {
        self.root.join(PROJECT_FILE)
    }

    /// Path to the ELT runner binary inside the project
    pub fn run_bin(&self) -> PathBuf {
        self.root.join(".airlift").join("run").join("bin")
    }

    /// Resolve the history database path from the database URI.
    ///
    /// Reads `AIRLIFT_DATABASE_URI` (falling back to the sqlite default
    /// under the project), substitutes the project-root placeholder, and
    /// rejects non-sqlite schemes.
    pub fn database_path(&self) -> Result<PathBuf> {
        let uri = env::var(DATABASE_URI_ENV).unwrap_or_else(|_| DEFAULT_DATABASE_URI.to_string());
        let uri = uri.replace(PROJECT_ROOT_PLACEHOLDER, &self.root.to_string_lossy());

        let rest = uri
            .strip_prefix("sqlite://")
            .ok_or_else(|| eyre!("Unsupported database URI (only sqlite:// is supported): {}", uri))?;

        // sqlite:///abs/path and sqlite:////abs/path both mean /abs/path
        let path = format!("/{}", rest.trim_start_matches('/'));
        Ok(PathBuf::from(path))
    }
}
