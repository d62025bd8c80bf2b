//! Storage operations
//!
//! Persists uploads, removes stored paths and creates folders. Every path
//! taken here has already been through the [`PathResolver`].

use log::{error, info, warn};
use std::fs::{self, OpenOptions};
use std::io::{self, ErrorKind, Read, Write};
use std::path::Path;

use crate::config::StorageConfig;
use crate::error::{StorageError, StorageResult};
use crate::storage::naming;
use crate::storage::results::{DeleteReport, DeleteStatus, StoredFile};
use crate::storage::validation::{PathResolver, ResolvedPath, StorageRoot};

/// Removes a file on drop unless the write it guards was committed
struct PartialFile<'a> {
    path: &'a Path,
    committed: bool,
}

impl<'a> PartialFile<'a> {
    fn new(path: &'a Path) -> Self {
        Self {
            path,
            committed: false,
        }
    }

    fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for PartialFile<'_> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        match fs::remove_file(self.path) {
            Ok(()) => warn!("Removed partial upload {}", self.path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => error!(
                "Failed to remove partial upload {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}

/// Filesystem-backed store for uploaded payloads
#[derive(Debug, Clone)]
pub struct FileStore {
    resolver: PathResolver,
    origin: String,
}

impl FileStore {
    pub fn new(resolver: PathResolver, origin: impl Into<String>) -> Self {
        Self {
            resolver,
            origin: origin.into(),
        }
    }

    pub fn from_config(config: &StorageConfig) -> io::Result<Self> {
        let root = StorageRoot::new(&config.root)?;
        Ok(Self::new(PathResolver::new(root), config.origin.clone()))
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// Public URL of a stored path: origin, `/`, then the root-relative path
    pub fn public_url(&self, path: &ResolvedPath) -> String {
        format!(
            "{}/{}",
            self.origin.trim_end_matches('/'),
            path.to_slash_path()
        )
    }

    /// Write `payload` into `dir` under a freshly generated name
    pub fn store<R: Read>(
        &self,
        dir: &ResolvedPath,
        mut payload: R,
        original_filename: &str,
    ) -> StorageResult<StoredFile> {
        let name = naming::generate(original_filename)?;

        if let Err(e) = fs::create_dir_all(dir) {
            error!("Failed to create directories {}: {}", dir, e);
            return Err(e.into());
        }

        let target = dir.join_file_name(&name.unique_name);

        let mut file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
        {
            Ok(file) => file,
            Err(e) => {
                error!("Failed to create file {}: {}", target, e);
                return Err(e.into());
            }
        };

        let guard = PartialFile::new(target.as_path());

        let written = io::copy(&mut payload, &mut file).and_then(|_| file.flush());
        drop(file);
        if let Err(e) = written {
            error!("Failed to write payload to {}: {}", target, e);
            return Err(e.into());
        }

        let size = match fs::metadata(&target) {
            Ok(meta) => meta.len(),
            Err(e) => {
                error!("Failed to get file({}) info: {}", target, e);
                return Err(e.into());
            }
        };
        guard.commit();

        let url = self.public_url(&target);
        info!(
            "Stored {} as {} ({} bytes)",
            original_filename, target, size
        );

        Ok(StoredFile {
            unique_name: name.unique_name,
            extension: name.extension,
            path: target,
            size,
            url,
        })
    }

    /// Remove a single stored file or empty folder
    pub fn remove(&self, path: &ResolvedPath) -> DeleteStatus {
        if path.is_root() {
            warn!("Refused to remove the storage root");
            return DeleteStatus::Rejected("cannot remove the storage root".into());
        }

        let result = match fs::symlink_metadata(path) {
            Ok(meta) if meta.is_dir() => fs::remove_dir(path),
            Ok(_) => fs::remove_file(path),
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                info!("Removed {}", path);
                DeleteStatus::Removed
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("Failed to remove path({}): not found", path);
                DeleteStatus::NotFound
            }
            Err(e) => {
                warn!("Failed to remove path({}): {}", path, e);
                DeleteStatus::Failed(e.to_string())
            }
        }
    }

    /// Best-effort removal of every target; never stops at the first failure
    ///
    /// Each target carries the label it is reported under and its resolution
    /// result. Targets that failed resolution are reported as rejected and
    /// never reach the filesystem.
    pub fn delete<I, S>(&self, targets: I) -> DeleteReport
    where
        I: IntoIterator<Item = (S, StorageResult<ResolvedPath>)>,
        S: Into<String>,
    {
        let mut report = DeleteReport::default();
        for (label, resolved) in targets {
            let label = label.into();
            let status = match resolved {
                Ok(path) => self.remove(&path),
                Err(e) => {
                    warn!("Rejected delete of {:?}: {}", label, e);
                    DeleteStatus::Rejected(e.to_string())
                }
            };
            report.push(label, status);
        }
        report
    }

    /// Create a folder and any missing ancestors
    pub fn create_folder(&self, dir: &ResolvedPath) -> StorageResult<()> {
        fs::create_dir_all(dir).map_err(|e| {
            error!("Failed to create folder {}: {}", dir, e);
            StorageError::from(e)
        })?;
        info!("Created folder {}", dir);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn store_in(temp: &TempDir) -> FileStore {
        let root = StorageRoot::new(temp.path()).unwrap();
        FileStore::new(PathResolver::new(root), "http://localhost:8080/public/")
    }

    /// Yields some bytes, then fails
    struct BrokenReader {
        sent: bool,
    }

    impl Read for BrokenReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.sent {
                return Err(io::Error::new(ErrorKind::ConnectionReset, "peer went away"));
            }
            self.sent = true;
            buf[..4].copy_from_slice(b"half");
            Ok(4)
        }
    }

    #[test]
    fn test_store_round_trip() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);
        let payload = b"\x00\x01binary\xffpayload".to_vec();

        let dir = store.resolver().resolve("docs/2024").unwrap();
        let stored = store.store(&dir, Cursor::new(&payload), "report.pdf").unwrap();

        assert_eq!(stored.size, payload.len() as u64);
        assert_eq!(stored.extension, ".pdf");
        assert_eq!(fs::read(stored.path.as_path()).unwrap(), payload);
        assert_eq!(
            stored.url,
            format!("http://localhost:8080/public/docs/2024/{}", stored.unique_name)
        );
    }

    #[test]
    fn test_store_into_root() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);

        let root = store.resolver().resolve("").unwrap();
        let stored = store.store(&root, Cursor::new(b"x"), "a.txt").unwrap();
        assert_eq!(stored.path.to_slash_path(), stored.unique_name);
    }

    #[test]
    fn test_store_without_extension_creates_nothing() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);

        let dir = store.resolver().resolve("never").unwrap();
        let result = store.store(&dir, Cursor::new(b"data"), "README");

        assert!(matches!(result, Err(StorageError::InvalidExtension(_))));
        assert!(!temp.path().join("never").exists());
    }

    #[test]
    fn test_failed_copy_leaves_no_partial_file() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);

        let dir = store.resolver().resolve("uploads").unwrap();
        let result = store.store(&dir, BrokenReader { sent: false }, "a.bin");

        assert!(matches!(result, Err(StorageError::IoError(_))));
        assert_eq!(fs::read_dir(temp.path().join("uploads")).unwrap().count(), 0);
    }

    #[test]
    fn test_delete_reports_each_path() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);
        fs::write(temp.path().join("real.txt"), b"x").unwrap();

        let resolver = store.resolver();
        let report = store.delete(
            ["missing.txt", "real.txt", "../outside.txt"]
                .map(|path| (path, resolver.resolve(path))),
        );

        let labels: Vec<_> = report.outcomes.iter().map(|o| o.path.as_str()).collect();
        assert_eq!(labels, vec!["missing.txt", "real.txt", "../outside.txt"]);
        assert_eq!(report.status_of("missing.txt"), Some(&DeleteStatus::NotFound));
        assert_eq!(report.status_of("real.txt"), Some(&DeleteStatus::Removed));
        assert!(matches!(
            report.status_of("../outside.txt"),
            Some(DeleteStatus::Rejected(_))
        ));
        assert!(!temp.path().join("real.txt").exists());
        assert!(!report.is_complete());
    }

    #[test]
    fn test_remove_folder_and_root() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);
        fs::create_dir_all(temp.path().join("empty")).unwrap();
        fs::create_dir_all(temp.path().join("full")).unwrap();
        fs::write(temp.path().join("full/f.txt"), b"x").unwrap();

        let resolver = store.resolver();
        assert_eq!(
            store.remove(&resolver.resolve("empty").unwrap()),
            DeleteStatus::Removed
        );
        assert!(matches!(
            store.remove(&resolver.resolve("full").unwrap()),
            DeleteStatus::Failed(_)
        ));
        assert!(matches!(
            store.remove(&resolver.resolve("").unwrap()),
            DeleteStatus::Rejected(_)
        ));
        assert!(temp.path().exists());
    }

    #[test]
    fn test_create_folder_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);

        let dir = store.resolver().resolve("a/b/c").unwrap();
        store.create_folder(&dir).unwrap();
        store.create_folder(&dir).unwrap();
        assert!(temp.path().join("a/b/c").is_dir());
    }
}
