use super::{
    parsing::{normalize_hosts, parse_bind_addr, parse_provider_scheme, parse_size_limit},
    Config, PipelineConfig,
};
use crate::cli::Cli;
use anyhow::Result;
use std::path::PathBuf;

impl TryFrom<Cli> for Config {
    type Error = anyhow::Error;

    fn try_from(cli: Cli) -> Result<Self, Self::Error> {
        ConfigBuilder::from_cli(cli).build()
    }
}

/// A builder for creating a `Config` programmatically or from the CLI.
///
/// Unset options fall back to the `Config` defaults.
///
/// # Examples
///
/// ```
/// use repotar::ConfigBuilder;
///
/// let config = ConfigBuilder::new()
///     .port(9000)
///     .max_download_size("100MiB")
///     .allowed_hosts(vec!["github.com".to_string()])
///     .build()
///     .unwrap();
///
/// assert_eq!(config.bind_addr.port(), 9000);
/// assert_eq!(config.pipeline.max_download_size, Some(100 * 1024 * 1024));
/// ```
#[derive(Debug, Default, Clone)]
pub struct ConfigBuilder {
    port: Option<u16>,
    bind: Option<String>,
    workspace_dir: Option<String>,
    max_download_size: Option<String>,
    max_extracted_size: Option<String>,
    allowed_hosts: Option<Vec<String>>,
    provider_scheme: Option<String>,
    enforce_timeout: Option<bool>,
    user_agent: Option<String>,
}

impl ConfigBuilder {
    /// Creates a new builder with every option unset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a builder from parsed CLI arguments.
    pub fn from_cli(cli: Cli) -> Self {
        Self {
            port: Some(cli.port),
            bind: Some(cli.bind),
            workspace_dir: cli.workspace_dir,
            max_download_size: cli.max_download_size,
            max_extracted_size: cli.max_extracted_size,
            allowed_hosts: cli.allowed_hosts,
            provider_scheme: Some(cli.provider_scheme),
            enforce_timeout: Some(!cli.no_enforce_timeout),
            user_agent: None,
        }
    }

    /// Sets the listening port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Sets the bind address (an IP literal).
    pub fn bind(mut self, bind: impl Into<String>) -> Self {
        self.bind = Some(bind.into());
        self
    }

    /// Sets the parent directory for per-request workspaces.
    pub fn workspace_dir(mut self, dir: impl Into<String>) -> Self {
        self.workspace_dir = Some(dir.into());
        self
    }

    /// Sets the download size limit (e.g., "500MiB").
    pub fn max_download_size(mut self, size: impl Into<String>) -> Self {
        self.max_download_size = Some(size.into());
        self
    }

    /// Sets the extracted size limit (e.g., "2GiB").
    pub fn max_extracted_size(mut self, size: impl Into<String>) -> Self {
        self.max_extracted_size = Some(size.into());
        self
    }

    /// Restricts fetching to these hosts and their subdomains.
    pub fn allowed_hosts(mut self, hosts: Vec<String>) -> Self {
        self.allowed_hosts = Some(hosts);
        self
    }

    /// Sets the scheme for path-addressed repository URLs ("http" or "https").
    pub fn provider_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.provider_scheme = Some(scheme.into());
        self
    }

    /// Enables or disables enforcement of the request timeout.
    pub fn enforce_timeout(mut self, enforce: bool) -> Self {
        self.enforce_timeout = Some(enforce);
        self
    }

    /// Overrides the `User-Agent` sent to snapshot providers.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Validates the options and builds the `Config`.
    ///
    /// # Errors
    /// Returns an error for an invalid bind address, size string or scheme.
    pub fn build(self) -> Result<Config> {
        let defaults = Config::default();
        let port = self.port.unwrap_or(defaults.bind_addr.port());
        let bind_addr = match &self.bind {
            Some(bind) => parse_bind_addr(bind, port)?,
            None => std::net::SocketAddr::new(defaults.bind_addr.ip(), port),
        };
        let provider_scheme = match &self.provider_scheme {
            Some(scheme) => parse_provider_scheme(scheme)?,
            None => defaults.provider_scheme.clone(),
        };

        let pipeline = PipelineConfig {
            workspace_root: self
                .workspace_dir
                .filter(|d| !d.trim().is_empty())
                .map(PathBuf::from),
            max_download_size: parse_size_limit(self.max_download_size)?,
            max_extracted_size: parse_size_limit(self.max_extracted_size)?,
            allowed_hosts: normalize_hosts(self.allowed_hosts),
            user_agent: self
                .user_agent
                .unwrap_or_else(|| defaults.pipeline.user_agent.clone()),
        };
        log::debug!("Pipeline configuration: {:?}", pipeline);

        Ok(Config {
            bind_addr,
            provider_scheme,
            enforce_timeout: self.enforce_timeout.unwrap_or(defaults.enforce_timeout),
            pipeline,
            ..defaults
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;
    use std::time::Duration;

    #[test]
    fn test_basic_config_creation() -> Result<()> {
        let cli = Cli::parse_from(["repotar", "--port", "9090"]);
        let config = Config::try_from(cli)?;
        assert_eq!(config.bind_addr.port(), 9090);
        assert!(config.bind_addr.ip().is_unspecified());
        assert_eq!(config.provider_scheme, "https");
        assert_eq!(config.default_ref, "main");
        assert_eq!(config.default_get_timeout, Duration::from_secs(120));
        assert_eq!(config.post_timeout, Duration::from_secs(20));
        assert!(config.enforce_timeout);
        assert!(config.pipeline.max_download_size.is_none());
        assert!(config.pipeline.allowed_hosts.is_none());
        Ok(())
    }

    #[test]
    fn test_limits_and_allowlist_from_cli() -> Result<()> {
        let cli = Cli::parse_from([
            "repotar",
            "--port",
            "1",
            "--max-download-size",
            "1MiB",
            "--max-extracted-size",
            "2MiB",
            "--allowed-host",
            "GitHub.com",
            "gitlab.com",
            "--no-enforce-timeout",
        ]);
        let config = Config::try_from(cli)?;
        assert_eq!(config.pipeline.max_download_size, Some(1024 * 1024));
        assert_eq!(config.pipeline.max_extracted_size, Some(2 * 1024 * 1024));
        assert_eq!(
            config.pipeline.allowed_hosts,
            Some(vec!["github.com".to_string(), "gitlab.com".to_string()])
        );
        assert!(!config.enforce_timeout);
        Ok(())
    }

    #[test]
    fn test_invalid_size_is_rejected() {
        let result = ConfigBuilder::new().max_download_size("lots").build();
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_bind_is_rejected() {
        let result = ConfigBuilder::new().bind("not-an-ip").build();
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Invalid bind address"));
    }

    #[test]
    fn test_empty_workspace_dir_means_system_temp() -> Result<()> {
        let config = ConfigBuilder::new().workspace_dir("  ").build()?;
        assert!(config.pipeline.workspace_root.is_none());
        Ok(())
    }
}
