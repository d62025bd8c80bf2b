//! Stored file naming
//!
//! Every upload is stored under a fresh random name. The caller's filename
//! only contributes its extension.

use uuid::Uuid;

use crate::error::{StorageError, StorageResult};

/// A generated on-disk name and the extension it carries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedName {
    pub unique_name: String,
    pub extension: String,
}

/// Extract the extension (dot included) from the final component of `filename`
pub fn extension_of(filename: &str) -> Option<&str> {
    let file_part = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename);

    file_part.rfind('.').map(|idx| &file_part[idx..])
}

/// Generate a unique name for `original_filename`, keeping its extension
pub fn generate(original_filename: &str) -> StorageResult<GeneratedName> {
    let extension = extension_of(original_filename)
        .ok_or_else(|| StorageError::InvalidExtension(original_filename.to_string()))?;

    Ok(GeneratedName {
        unique_name: format!("{}{}", Uuid::new_v4(), extension),
        extension: extension.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_extension_kept() {
        let name = generate("photo.png").unwrap();
        assert_eq!(name.extension, ".png");
        assert!(name.unique_name.ends_with(".png"));
        assert_ne!(name.unique_name, "photo.png");
    }

    #[test]
    fn test_last_dot_wins() {
        assert_eq!(extension_of("backup.tar.gz"), Some(".gz"));
        assert_eq!(extension_of(".bashrc"), Some(".bashrc"));
    }

    #[test]
    fn test_missing_extension_rejected() {
        for filename in ["README", "", "dir.d/README", "dir.d\\README"] {
            assert!(
                matches!(generate(filename), Err(StorageError::InvalidExtension(_))),
                "{filename:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_trailing_dot_is_an_extension() {
        let name = generate("trailing.").unwrap();
        assert_eq!(name.extension, ".");
        assert!(name.unique_name.ends_with('.'));
    }

    #[test]
    fn test_separators_never_reach_the_name() {
        let name = generate("../../etc/cron.d/evil.sh").unwrap();
        assert_eq!(name.extension, ".sh");
        assert!(!name.unique_name.contains('/'));
    }

    #[test]
    fn test_names_are_unique() {
        let names: HashSet<String> = (0..10_000)
            .map(|_| generate("photo.png").unwrap().unique_name)
            .collect();
        assert_eq!(names.len(), 10_000);
    }
}
