//! Storage service
//!
//! The entry point for request handlers: every operation takes logical
//! paths, resolves them and hands the resolved form to the store or archiver.

use log::info;
use std::io::{self, Read};

use crate::config::StorageConfig;
use crate::error::StorageResult;
use crate::storage::archive;
use crate::storage::operations::FileStore;
use crate::storage::results::{ArchiveBuffer, DeleteReport, StoredFile};

#[derive(Debug, Clone)]
pub struct StorageService {
    store: FileStore,
}

impl StorageService {
    pub fn new(store: FileStore) -> Self {
        Self { store }
    }

    pub fn from_config(config: &StorageConfig) -> io::Result<Self> {
        Ok(Self::new(FileStore::from_config(config)?))
    }

    pub fn file_store(&self) -> &FileStore {
        &self.store
    }

    /// Store `payload` under the folder `logical_dir` (empty means the root)
    pub fn store<R: Read>(
        &self,
        logical_dir: &str,
        payload: R,
        original_filename: &str,
    ) -> StorageResult<StoredFile> {
        let dir = self.store.resolver().resolve(logical_dir)?;
        self.store.store(&dir, payload, original_filename)
    }

    /// Remove every listed path, reporting each one in request order
    pub fn delete<S: AsRef<str>>(&self, logical_paths: &[S]) -> DeleteReport {
        let resolver = self.store.resolver();
        let targets = logical_paths.iter().map(|logical| {
            let logical = logical.as_ref();
            (logical.trim().to_string(), resolver.resolve(logical))
        });
        let report = self.store.delete(targets);

        info!(
            "Delete request finished: {}/{} removed",
            report.removed_count(),
            report.outcomes.len()
        );
        report
    }

    pub fn create_folder(&self, logical_dir: &str) -> StorageResult<()> {
        let dir = self.store.resolver().resolve(logical_dir)?;
        self.store.create_folder(&dir)
    }

    pub fn archive(&self, logical_dir: &str) -> StorageResult<ArchiveBuffer> {
        let dir = self.store.resolver().resolve(logical_dir)?;
        archive::archive(&dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use crate::storage::results::DeleteStatus;
    use std::fs;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn service(temp: &TempDir) -> StorageService {
        let root = temp.path().join("files");
        StorageService::from_config(&StorageConfig {
            root,
            origin: "http://localhost:8080/public".into(),
        })
        .unwrap()
    }

    #[test]
    fn test_traversal_touches_nothing() {
        let temp = TempDir::new().unwrap();
        let service = service(&temp);

        let result = service.store("../escaped", Cursor::new(b"x"), "a.txt");
        assert!(matches!(result, Err(StorageError::PathTraversal(_))));
        assert!(matches!(
            service.create_folder("../../made"),
            Err(StorageError::PathTraversal(_))
        ));
        assert!(matches!(
            service.archive(".."),
            Err(StorageError::PathTraversal(_))
        ));

        assert!(!temp.path().join("escaped").exists());
        assert!(!temp.path().join("files").exists());
    }

    #[test]
    fn test_delete_mixes_outcomes() {
        let temp = TempDir::new().unwrap();
        let service = service(&temp);
        service.create_folder("").unwrap();
        fs::write(temp.path().join("files/real.txt"), b"x").unwrap();
        fs::write(temp.path().join("outside.txt"), b"x").unwrap();

        let report = service.delete(&["missing.txt", "real.txt", "../outside.txt"]);

        assert_eq!(report.status_of("missing.txt"), Some(&DeleteStatus::NotFound));
        assert_eq!(report.status_of("real.txt"), Some(&DeleteStatus::Removed));
        assert!(matches!(
            report.status_of("../outside.txt"),
            Some(DeleteStatus::Rejected(_))
        ));
        assert!(temp.path().join("outside.txt").exists());
        assert_eq!(report.removed_count(), 1);
    }

    #[test]
    fn test_store_then_archive() {
        let temp = TempDir::new().unwrap();
        let service = service(&temp);

        let stored = service
            .store(" albums/summer ", Cursor::new(b"jpeg bytes"), "beach.jpg")
            .unwrap();
        assert_eq!(
            stored.path.to_slash_path(),
            format!("albums/summer/{}", stored.unique_name)
        );

        let buffer = service.archive("albums").unwrap();
        let mut zip = zip::ZipArchive::new(Cursor::new(buffer.into_inner())).unwrap();
        let name = format!("albums/summer/{}", stored.unique_name);
        let mut content = Vec::new();
        zip.by_name(&name).unwrap().read_to_end(&mut content).unwrap();
        assert_eq!(content, b"jpeg bytes");
    }
}
