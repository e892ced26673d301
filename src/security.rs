// src/security.rs

//! Path confinement and host allowlisting.

use std::path::{Component, Path, PathBuf};
use tracing::warn;
use url::Url;

/// Joins an archive-relative `name` onto `root`, refusing names that could escape it.
///
/// Rejects absolute names, drive/UNC prefixes and any `..` component. `.`
/// components are dropped. Backslashes are treated as separators so that
/// archives produced on Windows cannot smuggle traversal past the check.
/// Returns `None` for rejected or empty names.
///
/// # Examples
/// ```
/// use repotar::security::enclosed_path;
/// use std::path::Path;
///
/// let root = Path::new("/work/repo");
/// assert_eq!(
///     enclosed_path(root, "widgets-main/src/lib.rs"),
///     Some(root.join("widgets-main/src/lib.rs"))
/// );
/// assert_eq!(enclosed_path(root, "../../etc/passwd"), None);
/// assert_eq!(enclosed_path(root, "/etc/passwd"), None);
/// ```
pub fn enclosed_path(root: &Path, name: &str) -> Option<PathBuf> {
    let normalized = name.replace('\\', "/");
    let relative = Path::new(&normalized);
    let mut clean = PathBuf::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                warn!("Security Block: Archive entry escapes root: '{}'", name);
                return None;
            }
        }
    }
    if clean.as_os_str().is_empty() {
        return None;
    }
    let joined = root.join(&clean);
    // Lexically redundant after the component scan, kept as the final prefix invariant.
    if !joined.starts_with(root) {
        warn!("Security Block: Archive entry escapes root: '{}'", name);
        return None;
    }
    Some(joined)
}

/// Checks that `path` resolves (following symlinks) to a location inside `root`.
///
/// Both paths must exist. Returns `false` when either cannot be canonicalized.
pub fn resolves_within(root: &Path, path: &Path) -> bool {
    match (std::fs::canonicalize(root), std::fs::canonicalize(path)) {
        (Ok(canonical_root), Ok(canonical_path)) => {
            if canonical_path.starts_with(&canonical_root) {
                true
            } else {
                warn!(
                    "Security Block: Path traversal attempt. Resolved '{}' is outside root '{}'",
                    canonical_path.display(),
                    canonical_root.display()
                );
                false
            }
        }
        _ => false,
    }
}

/// Checks a repository URL's host against an optional allowlist.
///
/// `None` allows every host. Otherwise the host must match an entry exactly or
/// be a subdomain of one. Returns the offending host on rejection.
///
/// # Examples
/// ```
/// use repotar::security::check_host_allowed;
///
/// let allowed = Some(vec!["github.com".to_string()]);
/// assert!(check_host_allowed("https://github.com/acme/widgets", &allowed).is_ok());
/// assert!(check_host_allowed("https://codeload.github.com/acme/widgets", &allowed).is_ok());
/// assert!(check_host_allowed("https://evil.example/acme/widgets", &allowed).is_err());
/// assert!(check_host_allowed("https://evil.example/acme/widgets", &None).is_ok());
/// ```
pub fn check_host_allowed(
    repo_url: &str,
    allowed_hosts: &Option<Vec<String>>,
) -> Result<(), String> {
    let Some(domains) = allowed_hosts else {
        return Ok(());
    };
    let host = Url::parse(repo_url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
        .unwrap_or_default();
    let allowed = domains.iter().any(|d| {
        let d = d.to_ascii_lowercase();
        host == d || host.ends_with(&format!(".{}", d))
    });
    if allowed {
        Ok(())
    } else {
        warn!("Security Block: Domain not in allowlist: '{}'", host);
        Err(host)
    }
}
