//! Unpacks snapshot zips into the workspace.

use crate::cancellation::CancellationToken;
use crate::errors::{extraction_error, Result};
use crate::security::enclosed_path;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::Path;
use zip::ZipArchive;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

/// Counts of what an extraction produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractSummary {
    /// Regular files written.
    pub files: usize,
    /// Directories created from explicit directory entries.
    pub directories: usize,
    /// Entries skipped because their names would escape the destination root.
    pub skipped: usize,
    /// Total bytes of file content written.
    pub bytes: u64,
}

/// Extracts the zip at `zip_path` into `destination_root`.
///
/// Every entry is handled on its own: directory entries are created with any
/// missing ancestors, file entries get their parent directories created on
/// demand before their content is copied, so entry order does not matter.
/// The entry's declared unix permission bits are applied to extracted files.
///
/// Entry names that are absolute or contain `..` are skipped with a warning;
/// nothing is ever written outside `destination_root`.
///
/// # Errors
/// Returns `Error::Extraction` if the zip cannot be opened (corrupt or
/// truncated download), an entry cannot be read or written, or the total
/// extracted size exceeds `max_total_size`. Returns `Error::Cancelled` if
/// `token` is cancelled between entries.
pub fn extract(
    zip_path: &Path,
    destination_root: &Path,
    max_total_size: Option<u64>,
    token: &CancellationToken,
) -> Result<ExtractSummary> {
    let file = File::open(zip_path).map_err(|e| extraction_error(e, zip_path))?;
    let mut archive = ZipArchive::new(file).map_err(|e| extraction_error(e.into(), zip_path))?;
    fs::create_dir_all(destination_root).map_err(|e| extraction_error(e, destination_root))?;

    let mut summary = ExtractSummary::default();

    for index in 0..archive.len() {
        token.check()?;
        let mut entry = archive
            .by_index(index)
            .map_err(|e| extraction_error(e.into(), zip_path))?;
        let name = entry.name().to_string();

        let Some(target) = enclosed_path(destination_root, &name) else {
            log::warn!("Skipping unsafe archive entry: '{}'", name);
            summary.skipped += 1;
            continue;
        };
        log::debug!("Extracting file: {}", target.display());

        if entry.is_dir() {
            fs::create_dir_all(&target).map_err(|e| extraction_error(e, &target))?;
            summary.directories += 1;
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| extraction_error(e, parent))?;
        }

        let mut outfile = File::create(&target).map_err(|e| extraction_error(e, &target))?;
        let copied = match max_total_size {
            Some(limit) => {
                // One byte past the remaining budget is enough to detect overflow.
                let budget = limit.saturating_sub(summary.bytes).saturating_add(1);
                io::copy(&mut (&mut entry).take(budget), &mut outfile)
            }
            None => io::copy(&mut entry, &mut outfile),
        }
        .map_err(|e| extraction_error(e, &target))?;
        drop(outfile);

        summary.bytes = summary.bytes.saturating_add(copied);
        if let Some(limit) = max_total_size {
            if summary.bytes > limit {
                return Err(extraction_error(
                    io::Error::new(
                        io::ErrorKind::Other,
                        format!("snapshot exceeds the extracted size limit of {} bytes", limit),
                    ),
                    zip_path,
                ));
            }
        }

        #[cfg(unix)]
        {
            if let Some(mode) = entry.unix_mode() {
                fs::set_permissions(&target, fs::Permissions::from_mode(mode & 0o777))
                    .map_err(|e| extraction_error(e, &target))?;
            }
        }
        summary.files += 1;
    }

    log::debug!(
        "Extracted {} files and {} directories ({} bytes) from {}",
        summary.files,
        summary.directories,
        summary.bytes,
        zip_path.display()
    );
    Ok(summary)
}
