//! Turns the two supported request shapes into a `FetchRequest`.
//!
//! - Path-addressed: `GET /{provider}/{owner}/{repo}[/{subPath...}]?ref=&timeout=`
//! - Body-addressed: `POST /` with `{ "path", "repoURL", "targetRevision" }`

use crate::config::Config;
use crate::core_types::FetchSpec;
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

/// A `FetchSpec` plus the timeout the caller asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// What to fetch.
    pub spec: FetchSpec,
    /// Requested deadline for fetch + extract + repack. Zero means none.
    pub timeout: Duration,
}

/// Query parameters of the path-addressed form.
///
/// Both are kept as raw strings so that an empty value falls back to the
/// default and a malformed `timeout` can be reported precisely.
#[derive(Debug, Default, Deserialize)]
pub struct PathQuery {
    /// Revision to fetch.
    #[serde(rename = "ref")]
    pub git_ref: Option<String>,
    /// Timeout in seconds.
    pub timeout: Option<String>,
}

/// JSON body of the body-addressed form.
#[derive(Debug, Default, Deserialize)]
pub struct BodyRequest {
    /// Optional subdirectory.
    #[serde(default)]
    pub path: Option<String>,
    /// Repository URL, `scheme://host/owner/repo`.
    #[serde(rename = "repoURL", default)]
    pub repo_url: Option<String>,
    /// Revision to fetch.
    #[serde(rename = "targetRevision", default)]
    pub target_revision: Option<String>,
}

/// Interprets a path-addressed request.
///
/// `path` is the decoded request path, with or without its leading slash.
///
/// # Errors
/// Returns `Error::RequestMalformed` when fewer than three segments are
/// present or `timeout` is not a non-negative integer.
///
/// # Examples
/// ```
/// use repotar::config::Config;
/// use repotar::request::{from_path, PathQuery};
/// use std::time::Duration;
///
/// let config = Config::default();
/// let query = PathQuery { git_ref: Some("v2".into()), timeout: Some("30".into()) };
/// let request = from_path("/github.com/acme/widgets/lib", &query, &config).unwrap();
///
/// assert_eq!(request.spec.repo_url, "https://github.com/acme/widgets");
/// assert_eq!(request.spec.sub_path, "lib");
/// assert_eq!(request.spec.archive_url(), "https://github.com/acme/widgets/archive/v2.zip");
/// assert_eq!(request.timeout, Duration::from_secs(30));
/// ```
pub fn from_path(path: &str, query: &PathQuery, config: &Config) -> Result<FetchRequest> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    let parts: Vec<&str> = trimmed.split('/').collect();
    if parts.len() < 3 {
        return Err(Error::RequestMalformed(
            "Invalid URL format. Expected: /provider/owner/repo/path".to_string(),
        ));
    }

    let (provider, owner, repo) = (parts[0], parts[1], parts[2]);
    let sub_path = parts[3..].join("/");

    let git_ref = query
        .git_ref
        .as_deref()
        .filter(|r| !r.is_empty())
        .unwrap_or(&config.default_ref)
        .to_string();

    let timeout = match query.timeout.as_deref().filter(|t| !t.is_empty()) {
        Some(raw) => Duration::from_secs(
            raw.parse::<u64>()
                .map_err(|_| Error::RequestMalformed("Invalid timeout value".to_string()))?,
        ),
        None => config.default_get_timeout,
    };

    let repo_url = format!(
        "{}://{}/{}/{}",
        config.provider_scheme, provider, owner, repo
    );

    Ok(FetchRequest {
        spec: FetchSpec {
            repo_url,
            git_ref,
            sub_path,
            repo_name: repo.to_string(),
        },
        timeout,
    })
}

/// Interprets a body-addressed request from its raw JSON bytes.
///
/// The body is decoded regardless of `Content-Type`.
///
/// # Errors
/// Returns `Error::RequestMalformed` for invalid JSON, a missing or empty
/// `repoURL`/`targetRevision`, or a `repoURL` that is not shaped
/// `scheme://host/owner/repo`.
pub fn from_body(body: &[u8], config: &Config) -> Result<FetchRequest> {
    let request: BodyRequest = serde_json::from_slice(body)
        .map_err(|_| Error::RequestMalformed("Invalid JSON body".to_string()))?;

    let (Some(repo_url), Some(target_revision)) = (
        request.repo_url.filter(|u| !u.is_empty()),
        request.target_revision.filter(|r| !r.is_empty()),
    ) else {
        return Err(Error::RequestMalformed(
            "Missing required fields: repoURL and targetRevision".to_string(),
        ));
    };

    let repo_name = repo_name_from_url(&repo_url).ok_or_else(|| {
        Error::RequestMalformed(
            "Invalid repoURL. Expected: scheme://host/owner/repo".to_string(),
        )
    })?;

    Ok(FetchRequest {
        spec: FetchSpec {
            repo_url,
            git_ref: target_revision,
            sub_path: request.path.unwrap_or_default(),
            repo_name,
        },
        timeout: config.post_timeout,
    })
}

/// Derives the repository name from `scheme://host/owner/repo`: the second path segment.
///
/// ```
/// use repotar::request::repo_name_from_url;
///
/// assert_eq!(repo_name_from_url("https://github.com/acme/widgets").as_deref(), Some("widgets"));
/// assert_eq!(repo_name_from_url("https://github.com/acme/widgets/").as_deref(), Some("widgets"));
/// assert_eq!(repo_name_from_url("https://github.com/acme"), None);
/// assert_eq!(repo_name_from_url("not a url"), None);
/// ```
pub fn repo_name_from_url(repo_url: &str) -> Option<String> {
    let url = Url::parse(repo_url).ok()?;
    url.host_str()?;
    let mut segments = url.path_segments()?.filter(|s| !s.is_empty());
    let _owner = segments.next()?;
    segments.next().map(str::to_string)
}
