//! Repacks a directory tree into a `.tar.gz` file.

use crate::cancellation::CancellationToken;
use crate::errors::{repack_error, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use tar::{Builder, EntryType, Header};
use walkdir::WalkDir;

/// Writes every entry under `source_root` into a gzip-compressed tar at `output_path`.
///
/// Entries are visited in lexical order and named relative to `source_root`
/// (the root itself is not an entry). Regular files carry their content;
/// directories and symlinks are header-only, and symlink targets are stored
/// as found, never resolved. When `source_root` is a regular file (or a link to
/// one) the archive holds that single file under its own name. Returns the
/// number of entries written.
///
/// A failed pack may leave a partial file at `output_path`; it lives in the
/// request workspace and goes away with it.
///
/// # Errors
/// Returns `Error::Repack` if the walk, a header, or any write fails, and
/// `Error::Cancelled` if `token` is cancelled between entries.
pub fn pack(source_root: &Path, output_path: &Path, token: &CancellationToken) -> Result<usize> {
    let file = File::create(output_path).map_err(|e| repack_error(e, output_path))?;
    let encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
    let mut builder = Builder::new(encoder);
    builder.follow_symlinks(false);

    let mut count = 0usize;

    // The root itself may be a symlink (a sub-path naming a link); follow it.
    let root_meta = fs::metadata(source_root).map_err(|e| repack_error(e, source_root))?;
    if root_meta.is_file() {
        let name = source_root.file_name().map(Path::new).unwrap_or(source_root);
        let mut file = File::open(source_root).map_err(|e| repack_error(e, source_root))?;
        builder
            .append_file(name, &mut file)
            .map_err(|e| repack_error(e, source_root))?;
        count += 1;
    } else {
        let walker = WalkDir::new(source_root)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name();
        for entry in walker {
            token.check()?;
            let entry = entry.map_err(|e| {
                let path = e
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| source_root.to_path_buf());
                repack_error(e.into(), path)
            })?;
            let relative = entry
                .path()
                .strip_prefix(source_root)
                .unwrap_or_else(|_| entry.path());
            log::debug!("Adding file to tar.gz: {}", relative.display());
            append_entry(&mut builder, relative, entry.path())?;
            count += 1;
        }
    }

    let encoder = builder
        .into_inner()
        .map_err(|e| repack_error(e, output_path))?;
    let mut writer = encoder.finish().map_err(|e| repack_error(e, output_path))?;
    writer.flush().map_err(|e| repack_error(e, output_path))?;

    log::debug!(
        "Packed {} entries from {} into {}",
        count,
        source_root.display(),
        output_path.display()
    );
    Ok(count)
}

/// Appends one filesystem entry to the tar under `archive_path`.
fn append_entry<W: Write>(builder: &mut Builder<W>, archive_path: &Path, path: &Path) -> Result<()> {
    let metadata = fs::symlink_metadata(path).map_err(|e| repack_error(e, path))?;
    let file_type = metadata.file_type();

    if file_type.is_dir() {
        builder
            .append_dir(archive_path, path)
            .map_err(|e| repack_error(e, path))?;
    } else if file_type.is_symlink() {
        let target = fs::read_link(path).map_err(|e| repack_error(e, path))?;
        let mut header = Header::new_gnu();
        header.set_metadata(&metadata);
        header.set_entry_type(EntryType::Symlink);
        header.set_size(0);
        builder
            .append_link(&mut header, archive_path, &target)
            .map_err(|e| repack_error(e, path))?;
    } else if file_type.is_file() {
        let mut file = File::open(path).map_err(|e| repack_error(e, path))?;
        builder
            .append_file(archive_path, &mut file)
            .map_err(|e| repack_error(e, path))?;
    } else {
        log::debug!("Skipping special file: {}", path.display());
    }
    Ok(())
}
