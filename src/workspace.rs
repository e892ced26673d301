//! Per-request workspaces.
//!
//! Every request gets its own uniquely named temporary directory holding the
//! downloaded zip, the extraction directory and the output tarball. The
//! directory is removed recursively when the `Workspace` is closed or dropped,
//! so it never outlives the request and no two requests share one.

use crate::errors::{Error, Result};
use std::path::{Path, PathBuf};
use tempfile::{Builder as TempDirBuilder, TempDir};

/// Prefix of every workspace directory name.
pub const WORKSPACE_PREFIX: &str = "repo-download-";

/// An exclusively-owned temporary directory for one request.
#[derive(Debug)]
pub struct Workspace {
    dir: Option<TempDir>,
    root: PathBuf,
}

impl Workspace {
    /// Creates a new workspace under `parent`, or under the system temp dir when `None`.
    ///
    /// # Errors
    /// Returns `Error::Resource` if the directory cannot be created.
    pub fn open(parent: Option<&Path>) -> Result<Self> {
        let mut builder = TempDirBuilder::new();
        builder.prefix(WORKSPACE_PREFIX);
        let created = match parent {
            Some(parent) => builder.tempdir_in(parent),
            None => builder.tempdir(),
        };
        let dir = created.map_err(|source| Error::Resource {
            path: parent
                .map(Path::to_path_buf)
                .unwrap_or_else(std::env::temp_dir)
                .display()
                .to_string(),
            source,
        })?;
        let root = dir.path().to_path_buf();
        log::debug!("Opened workspace {}", root.display());
        Ok(Self {
            dir: Some(dir),
            root,
        })
    }

    /// The workspace root directory.
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Where the downloaded snapshot zip is stored.
    pub fn download_path(&self) -> PathBuf {
        self.root.join("repo.zip")
    }

    /// The directory the snapshot is extracted into.
    pub fn extract_dir(&self) -> PathBuf {
        self.root.join("repo")
    }

    /// Where an output archive called `name` is written.
    pub fn output_path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Removes the workspace, reporting any failure.
    ///
    /// Dropping a `Workspace` also removes it, but only logs failures.
    pub fn close(mut self) -> std::io::Result<()> {
        match self.dir.take() {
            Some(dir) => {
                log::debug!("Removing workspace {}", self.root.display());
                dir.close()
            }
            None => Ok(()),
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            log::debug!("Removing workspace {}", self.root.display());
            if let Err(e) = dir.close() {
                log::warn!(
                    "Failed to remove workspace '{}': {}",
                    self.root.display(),
                    e
                );
            }
        }
    }
}
