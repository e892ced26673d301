// src/cli.rs

use clap::Parser;

/// An HTTP service that turns a remote repository reference into a tarball.
///
/// repotar downloads a revision snapshot (zip) of a repository from its hosting
/// provider, optionally narrows it to a subdirectory, and streams the result back
/// as a `.tar.gz`. Requests use either `GET /{provider}/{owner}/{repo}[/{path}]?ref=&timeout=`
/// or `POST /` with a JSON body `{ "repoURL", "targetRevision", "path" }`.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    // --- Listener ---
    /// Port to listen on.
    #[arg(short = 'p', long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Address to bind the listener to.
    #[arg(short = 'b', long, value_name = "ADDR", default_value = "0.0.0.0")]
    pub bind: String,

    // --- Workspaces ---
    /// Directory under which per-request workspaces are created (defaults to the system temp dir).
    #[arg(short = 'w', long, env = "REPOTAR_WORKSPACE_DIR", value_name = "PATH")]
    pub workspace_dir: Option<String>,

    // --- Limits ---
    /// Maximum size of a downloaded snapshot (e.g., "500MiB", "1G"). Unlimited if unset.
    #[arg(long, value_name = "BYTES")]
    pub max_download_size: Option<String>,

    /// Maximum total size of the extracted snapshot (e.g., "2GiB"). Unlimited if unset.
    #[arg(long, value_name = "BYTES")]
    pub max_extracted_size: Option<String>,

    /// Only fetch from these hosts or their subdomains (repeatable). All hosts are allowed if unset.
    #[arg(short = 'a', long = "allowed-host", value_name = "HOST", num_args = 1..)]
    pub allowed_hosts: Option<Vec<String>>,

    // --- Request Interpretation ---
    /// Scheme used to build the repository URL for path-addressed requests.
    #[arg(long, value_name = "SCHEME", default_value = "https")]
    pub provider_scheme: String,

    /// Accept the client-supplied timeout but do not enforce it as a deadline.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub no_enforce_timeout: bool,
}
