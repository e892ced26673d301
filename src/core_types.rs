//! Defines the core data structures flowing through the request pipeline.
//!
//! `FetchSpec` is the canonical description of what to fetch, produced by the
//! request interpreter from either request shape. `PackedArchive` is what the
//! pipeline hands to the response streamer.

use crate::workspace::Workspace;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// The canonical, validated description of a repository slice to fetch.
///
/// # Examples
///
/// ```
/// use repotar::core_types::FetchSpec;
///
/// let spec = FetchSpec {
///     repo_url: "https://github.com/acme/widgets".to_string(),
///     git_ref: "v2".to_string(),
///     sub_path: "lib".to_string(),
///     repo_name: "widgets".to_string(),
/// };
///
/// assert_eq!(spec.archive_url(), "https://github.com/acme/widgets/archive/v2.zip");
/// assert_eq!(spec.snapshot_root(), "widgets-v2");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchSpec {
    /// The repository URL, shaped `scheme://host/owner/repo`.
    pub repo_url: String,
    /// The revision (branch, tag or commit) to fetch. Never empty.
    pub git_ref: String,
    /// Subdirectory inside the snapshot to narrow to. Empty means the whole snapshot.
    pub sub_path: String,
    /// The final path segment of `repo_url`.
    pub repo_name: String,
}

impl FetchSpec {
    /// The snapshot archive URL: `{repo_url}/archive/{ref}.zip`.
    pub fn archive_url(&self) -> String {
        format!(
            "{}/archive/{}.zip",
            self.repo_url.trim_end_matches('/'),
            self.git_ref
        )
    }

    /// The top-level folder the snapshot provider wraps its archive in: `{repo}-{ref}`.
    pub fn snapshot_root(&self) -> String {
        format!("{}-{}", self.repo_name, self.git_ref)
    }
}

/// A finished tarball, still living inside the workspace that produced it.
///
/// Dropping this value removes the workspace and therefore the archive.
#[derive(Debug)]
pub struct PackedArchive {
    /// The workspace owning every intermediate file of the request.
    pub workspace: Workspace,
    /// Absolute path of the `.tar.gz` file inside `workspace`.
    pub path: PathBuf,
    /// Suggested download filename, `repo-{unixTimestamp}.tar.gz`.
    pub name: String,
}

impl PackedArchive {
    /// Path of the archive file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Builds the output archive name from the current time: `repo-{unixTimestampSeconds}.tar.gz`.
pub fn archive_name_now() -> String {
    let seconds = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    archive_name_at(seconds)
}

/// Builds the output archive name for a given unix timestamp.
///
/// ```
/// assert_eq!(repotar::core_types::archive_name_at(1700000000), "repo-1700000000.tar.gz");
/// ```
pub fn archive_name_at(unix_seconds: u64) -> String {
    format!("repo-{}.tar.gz", unix_seconds)
}
