//! Narrows an extracted snapshot to a requested subdirectory.

use crate::errors::{Error, Result};
use crate::security::{enclosed_path, resolves_within};
use std::path::{Path, PathBuf};

/// Resolves the directory to repack.
///
/// With an empty `sub_path` this returns `destination_root` unchanged. Otherwise
/// the snapshot provider's wrapping folder `{repo_name}-{git_ref}` is joined with
/// `sub_path` under `destination_root` and the result must exist.
///
/// # Errors
/// Returns `Error::PathNotFound` when the path does not exist, or when
/// `sub_path` tries to leave the extracted snapshot (`..`, or a symlink
/// resolving outside `destination_root`).
///
/// # Examples
/// ```
/// use repotar::archive::resolve;
/// use std::fs;
///
/// let temp = tempfile::tempdir().unwrap();
/// fs::create_dir_all(temp.path().join("widgets-v2/lib")).unwrap();
///
/// let root = resolve(temp.path(), "widgets", "v2", "lib").unwrap();
/// assert_eq!(root, temp.path().join("widgets-v2/lib"));
///
/// assert_eq!(resolve(temp.path(), "widgets", "v2", "").unwrap(), temp.path());
/// assert!(resolve(temp.path(), "widgets", "v2", "docs").is_err());
/// ```
pub fn resolve(
    destination_root: &Path,
    repo_name: &str,
    git_ref: &str,
    sub_path: &str,
) -> Result<PathBuf> {
    if sub_path.is_empty() {
        return Ok(destination_root.to_path_buf());
    }

    let relative = format!("{}-{}/{}", repo_name, git_ref, sub_path);
    let not_found = || Error::PathNotFound {
        path: destination_root.join(&relative).display().to_string(),
    };

    let candidate = enclosed_path(destination_root, &relative).ok_or_else(not_found)?;
    if !candidate.exists() || !resolves_within(destination_root, &candidate) {
        return Err(not_found());
    }
    log::debug!("Narrowed snapshot to {}", candidate.display());
    Ok(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_nested_sub_path() -> anyhow::Result<()> {
        let temp = tempdir()?;
        fs::create_dir_all(temp.path().join("widgets-main/src/core"))?;

        let resolved = resolve(temp.path(), "widgets", "main", "src/core")?;

        assert_eq!(resolved, temp.path().join("widgets-main/src/core"));
        Ok(())
    }

    #[test]
    fn test_trailing_slash_is_tolerated() -> anyhow::Result<()> {
        let temp = tempdir()?;
        fs::create_dir_all(temp.path().join("widgets-main/src"))?;

        let resolved = resolve(temp.path(), "widgets", "main", "src/")?;

        assert_eq!(resolved, temp.path().join("widgets-main/src"));
        Ok(())
    }

    #[test]
    fn test_missing_sub_path_is_not_found() -> anyhow::Result<()> {
        let temp = tempdir()?;
        fs::create_dir_all(temp.path().join("widgets-main/src"))?;

        let result = resolve(temp.path(), "widgets", "main", "docs");

        match result {
            Err(Error::PathNotFound { path }) => assert!(path.ends_with("widgets-main/docs")),
            other => panic!("Expected PathNotFound, got {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn test_wrong_wrapping_folder_is_not_found() -> anyhow::Result<()> {
        let temp = tempdir()?;
        // Provider named the folder differently than `{repo}-{ref}`.
        fs::create_dir_all(temp.path().join("widgets-2/lib"))?;

        let result = resolve(temp.path(), "widgets", "v2", "lib");

        assert!(matches!(result, Err(Error::PathNotFound { .. })));
        Ok(())
    }

    #[test]
    fn test_traversal_is_not_found() -> anyhow::Result<()> {
        let temp = tempdir()?;
        let root = temp.path().join("repo");
        fs::create_dir_all(root.join("widgets-main"))?;
        fs::create_dir_all(temp.path().join("secret"))?;

        let result = resolve(&root, "widgets", "main", "../../secret");

        assert!(matches!(result, Err(Error::PathNotFound { .. })));
        Ok(())
    }

    #[test]
    fn test_sub_path_may_name_a_file() -> anyhow::Result<()> {
        let temp = tempdir()?;
        fs::create_dir_all(temp.path().join("widgets-main"))?;
        fs::write(temp.path().join("widgets-main/README.md"), "hi")?;

        let resolved = resolve(temp.path(), "widgets", "main", "README.md")?;

        assert!(resolved.is_file());
        Ok(())
    }
}
