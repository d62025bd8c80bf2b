//! Storage result types
//!
//! Defines result structures returned by storage operations.

use serde::Serialize;

use crate::storage::validation::ResolvedPath;

/// Result of a file storage operation
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub unique_name: String,
    pub extension: String,
    pub path: ResolvedPath,
    pub size: u64,
    pub url: String,
}

/// Outcome of removing a single path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum DeleteStatus {
    Removed,
    NotFound,
    /// The logical path did not resolve inside the storage root
    Rejected(String),
    Failed(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct PathOutcome {
    pub path: String,
    #[serde(flatten)]
    pub status: DeleteStatus,
}

/// Per-path results of a delete call, in request order
#[derive(Debug, Clone, Default, Serialize)]
pub struct DeleteReport {
    pub outcomes: Vec<PathOutcome>,
}

impl DeleteReport {
    pub fn push(&mut self, path: impl Into<String>, status: DeleteStatus) {
        self.outcomes.push(PathOutcome {
            path: path.into(),
            status,
        });
    }

    pub fn removed_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == DeleteStatus::Removed)
            .count()
    }

    /// True when every requested path was removed
    pub fn is_complete(&self) -> bool {
        self.removed_count() == self.outcomes.len()
    }

    pub fn status_of(&self, path: &str) -> Option<&DeleteStatus> {
        self.outcomes
            .iter()
            .find(|o| o.path == path)
            .map(|o| &o.status)
    }
}

/// A finalized zip of a directory subtree, held in memory
#[derive(Debug, Clone)]
pub struct ArchiveBuffer(Vec<u8>);

impl ArchiveBuffer {
    pub(crate) fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }
}
