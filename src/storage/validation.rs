//! Path validation
//!
//! Resolves untrusted logical paths against the storage root. Resolution is
//! purely lexical: nothing here touches the filesystem, so a rejected path
//! never reaches an OS call.

use std::fmt;
use std::io;
use std::path::{Component, MAIN_SEPARATOR_STR, Path, PathBuf};

use crate::error::{StorageError, StorageResult};

/// The single directory all stored content is confined to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageRoot(PathBuf);

impl StorageRoot {
    /// Build a root from a configured path, made absolute and cleaned
    pub fn new(root: impl AsRef<Path>) -> io::Result<Self> {
        let absolute = std::path::absolute(root.as_ref())?;
        Ok(Self(clean(&absolute)))
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

/// An absolute path verified to lie within the storage root
///
/// Only [`PathResolver`] constructs these.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedPath {
    absolute: PathBuf,
    relative: PathBuf,
}

impl ResolvedPath {
    pub fn as_path(&self) -> &Path {
        &self.absolute
    }

    /// Path relative to the storage root (empty for the root itself)
    pub fn relative(&self) -> &Path {
        &self.relative
    }

    pub fn is_root(&self) -> bool {
        self.relative.as_os_str().is_empty()
    }

    /// Relative path joined with `/` regardless of the host separator
    pub fn to_slash_path(&self) -> String {
        self.relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Child entry of this directory. `name` must be a single plain component.
    pub(crate) fn join_file_name(&self, name: &str) -> Self {
        debug_assert!(!name.contains(['/', '\\']) && name != "..");
        Self {
            absolute: self.absolute.join(name),
            relative: self.relative.join(name),
        }
    }
}

impl AsRef<Path> for ResolvedPath {
    fn as_ref(&self) -> &Path {
        &self.absolute
    }
}

impl fmt::Display for ResolvedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.absolute.display())
    }
}

/// Maps logical paths onto resolved paths under a fixed root
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: StorageRoot,
}

impl PathResolver {
    pub fn new(root: StorageRoot) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &StorageRoot {
        &self.root
    }

    /// Resolve a logical path, failing closed on anything outside the root
    ///
    /// Surrounding whitespace is trimmed and leading separators are ignored,
    /// so `/a/b` and `a/b` name the same location.
    pub fn resolve(&self, logical: &str) -> StorageResult<ResolvedPath> {
        let trimmed = logical.trim();
        let root = self.root.as_path();

        let mut joined = root.to_path_buf();
        for component in Path::new(trimmed).components() {
            match component {
                Component::Prefix(_) | Component::RootDir => {}
                other => joined.push(other.as_os_str()),
            }
        }
        let cleaned = clean(&joined);

        if !is_within(root, &cleaned) {
            return Err(StorageError::PathTraversal(trimmed.to_string()));
        }

        let relative = cleaned
            .strip_prefix(root)
            .map(Path::to_path_buf)
            .unwrap_or_default();

        Ok(ResolvedPath {
            absolute: cleaned,
            relative,
        })
    }
}

/// Lexically collapse `.` and `..` segments of an absolute path
fn clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // `..` above the filesystem root stays at the root
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// String-prefix containment check with a trailing separator on the root
fn is_within(root: &Path, candidate: &Path) -> bool {
    if candidate == root {
        return true;
    }

    let mut prefix = root.as_os_str().to_os_string();
    if !prefix.as_encoded_bytes().ends_with(MAIN_SEPARATOR_STR.as_bytes()) {
        prefix.push(MAIN_SEPARATOR_STR);
    }

    candidate
        .as_os_str()
        .as_encoded_bytes()
        .starts_with(prefix.as_encoded_bytes())
}
