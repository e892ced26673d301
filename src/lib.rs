//! `repotar` is a library and HTTP service that turns a remote repository
//! reference into a gzip-compressed tarball of the repository, or of one of its
//! subdirectories.
//!
//! It relies on the snapshot convention of common hosting providers, where
//! `{repoURL}/archive/{ref}.zip` serves a zip of the tree at `ref`, wrapped in a
//! single `{repo}-{ref}/` folder. No git tooling is involved.
//!
//! As a library, it exposes the request pipeline as a single blocking call:
//! 1.  **Workspace**: Allocate a private temporary directory for the request.
//! 2.  **Fetch**: Download the snapshot zip into the workspace.
//! 3.  **Extract**: Unpack it, refusing entries that would escape the workspace.
//! 4.  **Filter**: Narrow the tree to the requested subdirectory.
//! 5.  **Repack**: Write a `.tar.gz` of the narrowed tree.
//!
//! The returned `PackedArchive` owns its workspace; dropping it removes every
//! intermediate file. The `web` module wraps the same pipeline in an `axum`
//! router.
//!
//! # Example: Library Usage
//!
//! ```no_run
//! use repotar::{build_archive, CancellationToken, FetchSpec, PipelineConfig};
//! use std::time::Duration;
//!
//! let spec = FetchSpec {
//!     repo_url: "https://github.com/acme/widgets".to_string(),
//!     git_ref: "main".to_string(),
//!     sub_path: "docs".to_string(),
//!     repo_name: "widgets".to_string(),
//! };
//!
//! let archive = build_archive(
//!     &spec,
//!     &PipelineConfig::default(),
//!     Some(Duration::from_secs(60)),
//!     &CancellationToken::new(),
//! )
//! .unwrap();
//!
//! println!("{} is ready at {}", archive.name, archive.path().display());
//! // Dropping `archive` removes the workspace.
//! ```

pub mod archive;
pub mod cancellation;
pub mod cli;
pub mod config;
pub mod core_types;
pub mod errors;
pub mod fetch;
pub mod prelude;
pub mod request;
pub mod security;
pub mod web;
pub mod workspace;

// Re-export key public types for easier use as a library
pub use cancellation::CancellationToken;
pub use config::{Config, ConfigBuilder, PipelineConfig};
pub use core_types::{FetchSpec, PackedArchive};
pub use errors::{Error, Result};

use crate::core_types::archive_name_now;
use crate::fetch::FetchOptions;
use crate::workspace::Workspace;
use std::time::Duration;

/// Runs the full pipeline for `spec` and returns the finished archive.
///
/// This is a blocking call. `timeout` bounds the snapshot download at the
/// HTTP-client level; enforcing an overall deadline (and cancelling `token`
/// when it passes) is up to the caller. Every stage checks `token` and stops
/// early with `Error::Cancelled` once it is cancelled.
///
/// On success the workspace is moved into the returned `PackedArchive`. On any
/// error it is removed before this function returns.
///
/// # Errors
/// Returns the error of the first stage that fails; see [`errors::Error`].
pub fn build_archive(
    spec: &FetchSpec,
    config: &PipelineConfig,
    timeout: Option<Duration>,
    token: &CancellationToken,
) -> Result<PackedArchive> {
    if let Err(host) = security::check_host_allowed(&spec.repo_url, &config.allowed_hosts) {
        return Err(Error::HostNotAllowed { host });
    }

    let workspace = Workspace::open(config.workspace_root.as_deref())?;

    let archive_url = spec.archive_url();
    log::info!(
        "Fetching {} (ref '{}', path '{}')",
        spec.repo_url,
        spec.git_ref,
        spec.sub_path
    );
    let options = FetchOptions {
        timeout,
        max_size: config.max_download_size,
        user_agent: config.user_agent.clone(),
        allowed_hosts: config.allowed_hosts.clone(),
    };
    fetch::fetch(&archive_url, &workspace.download_path(), &options, token)?;

    let extract_dir = workspace.extract_dir();
    let summary = archive::extract(
        &workspace.download_path(),
        &extract_dir,
        config.max_extracted_size,
        token,
    )?;
    if summary.skipped > 0 {
        log::warn!(
            "Skipped {} unsafe entries while extracting {}",
            summary.skipped,
            archive_url
        );
    }

    let source = archive::resolve(&extract_dir, &spec.repo_name, &spec.git_ref, &spec.sub_path)?;

    let name = archive_name_now();
    let path = workspace.output_path(&name);
    let entries = archive::pack(&source, &path, token)?;
    log::info!("Created {} with {} entries", name, entries);

    Ok(PackedArchive {
        workspace,
        path,
        name,
    })
}
