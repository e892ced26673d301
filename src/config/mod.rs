//! Defines the `Config` struct and related types for server configuration.
//!
//! This module consolidates the settings parsed from the CLI (and environment),
//! making them available to the web layer and the pipeline in a structured and
//! type-safe manner.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

pub use builder::ConfigBuilder;
mod builder;
mod parsing;

/// Revision used when a path-addressed request omits `ref`.
pub const DEFAULT_REF: &str = "main";
/// Timeout (seconds) used when a path-addressed request omits `timeout`.
pub const DEFAULT_GET_TIMEOUT_SECS: u64 = 120;
/// Fixed timeout (seconds) for body-addressed requests.
pub const DEFAULT_POST_TIMEOUT_SECS: u64 = 20;
/// `User-Agent` sent to snapshot providers.
pub const DEFAULT_USER_AGENT: &str = concat!("repotar/", env!("CARGO_PKG_VERSION"));

/// Configuration options for the fetch/extract/repack pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Parent directory for per-request workspaces. `None` uses the system temp dir.
    pub workspace_root: Option<PathBuf>,
    /// Maximum number of bytes accepted from a snapshot download.
    pub max_download_size: Option<u64>,
    /// Maximum total number of bytes written while extracting a snapshot.
    pub max_extracted_size: Option<u64>,
    /// Hosts (and their subdomains) snapshots may be fetched from. `None` allows all.
    pub allowed_hosts: Option<Vec<String>>,
    /// `User-Agent` header for snapshot downloads.
    pub user_agent: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workspace_root: None,
            max_download_size: None,
            max_extracted_size: None,
            allowed_hosts: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Top-level server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Socket address the listener binds to.
    pub bind_addr: SocketAddr,
    /// Scheme used to build `repoURL` for path-addressed requests.
    pub provider_scheme: String,
    /// Revision used when a path-addressed request omits `ref`.
    pub default_ref: String,
    /// Timeout used when a path-addressed request omits `timeout`.
    pub default_get_timeout: Duration,
    /// Fixed timeout for body-addressed requests.
    pub post_timeout: Duration,
    /// Whether the request timeout is enforced as a deadline on the pipeline.
    pub enforce_timeout: bool,
    /// Configuration for the pipeline stages.
    pub pipeline: PipelineConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            provider_scheme: "https".to_string(),
            default_ref: DEFAULT_REF.to_string(),
            default_get_timeout: Duration::from_secs(DEFAULT_GET_TIMEOUT_SECS),
            post_timeout: Duration::from_secs(DEFAULT_POST_TIMEOUT_SECS),
            enforce_timeout: true,
            pipeline: PipelineConfig::default(),
        }
    }
}

impl Config {
    /// Creates a `Config` for tests whose workspaces live under `workspace_root`.
    ///
    /// This function is hidden from public documentation and is intended for
    /// use in tests only.
    #[doc(hidden)]
    pub fn new_for_test(workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            provider_scheme: "http".to_string(),
            pipeline: PipelineConfig {
                workspace_root: Some(workspace_root.into()),
                ..PipelineConfig::default()
            },
            ..Self::default()
        }
    }
}
