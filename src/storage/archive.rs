//! Folder archiving
//!
//! Builds an in-memory zip of a stored subtree. Entry names are relative to
//! the parent of the archived folder, so the folder itself is the top-level
//! directory inside the archive. The whole archive is held in memory before
//! it is returned; very large folders should not be exported this way.

use log::{error, info, warn};
use std::fs::{self, File};
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;
use zip::ZipWriter;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;

use crate::error::{StorageError, StorageResult};
use crate::storage::results::ArchiveBuffer;
use crate::storage::validation::ResolvedPath;

/// Internal causes of an archive failure, logged but never returned
#[derive(Debug, Error)]
enum ArchiveError {
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("walk failed: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("entry outside base: {0}")]
    OutsideBase(PathBuf),

    #[error("io: {0}")]
    Io(#[from] io::Error),

    #[error("zip: {0}")]
    Zip(#[from] ZipError),
}

/// Zip the folder at `base` into a finalized in-memory buffer
///
/// Any failure discards the partial archive and yields [`StorageError::Internal`].
pub fn archive(base: &ResolvedPath) -> StorageResult<ArchiveBuffer> {
    archive_with(base, |path: &Path| File::open(path))
}

/// [`archive`] with the way entry contents are opened supplied by the caller
fn archive_with<R, F>(base: &ResolvedPath, open: F) -> StorageResult<ArchiveBuffer>
where
    R: Read,
    F: FnMut(&Path) -> io::Result<R>,
{
    match build_archive(base.as_path(), open) {
        Ok(bytes) => {
            info!("Archived {} ({} bytes)", base, bytes.len());
            Ok(ArchiveBuffer::new(bytes))
        }
        Err(e) => {
            error!("Failed to archive path({}): {}", base, e);
            Err(StorageError::Internal)
        }
    }
}

fn build_archive<R, F>(base: &Path, mut open: F) -> Result<Vec<u8>, ArchiveError>
where
    R: Read,
    F: FnMut(&Path) -> io::Result<R>,
{
    if !fs::metadata(base)?.is_dir() {
        return Err(ArchiveError::NotADirectory(base.to_path_buf()));
    }

    let parent = base.parent().unwrap_or(base);
    let options = SimpleFileOptions::default();
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

    for entry in WalkDir::new(base).sort_by_file_name() {
        let entry = entry?;
        if entry.depth() == 0 {
            continue;
        }

        let name = entry_name(parent, entry.path())?;
        let file_type = entry.file_type();

        if file_type.is_dir() {
            zip.add_directory(format!("{name}/"), options)?;
        } else if file_type.is_file() {
            zip.start_file(name, options)?;
            let mut source = open(entry.path())?;
            io::copy(&mut source, &mut zip)?;
            drop(source);
        } else {
            // Links could point outside the storage root
            warn!("Skipping non-regular entry {}", entry.path().display());
        }
    }

    Ok(zip.finish()?.into_inner())
}

/// Archive entry name for `path`, relative to `parent` with `/` separators
fn entry_name(parent: &Path, path: &Path) -> Result<String, ArchiveError> {
    let relative = path
        .strip_prefix(parent)
        .map_err(|_| ArchiveError::OutsideBase(path.to_path_buf()))?;

    Ok(relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/"))
}
