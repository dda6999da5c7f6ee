//! Managed document storage
//!
//! Documents attached to references are copied under
//! `files/<category>/<label>.<ext>`. When a reference is removed its
//! document is moved to `files/archive/` or deleted.

use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};

use crate::config::Config;
use crate::storage::{StorageError, StorageResult};

/// Directory under the file store root that receives removed documents
pub const ARCHIVE_DIR: &str = "archive";

/// Storage for the documents behind references
pub trait FileStore {
    /// Copy `source` into the store and return the absolute stored path
    fn import_file(&self, source: &Path, category: &str, label: &str) -> StorageResult<PathBuf>;

    /// Archive or delete a stored document
    fn archive_or_delete(&self, path: &Path) -> StorageResult<()>;
}

/// `FileStore` on the local filesystem
#[derive(Debug, Clone)]
pub struct LocalFileStore {
    root: PathBuf,
    archive: bool,
}

impl LocalFileStore {
    pub fn new(config: &Config) -> Self {
        Self::with_root(config.files_dir(), config.archive_removed)
    }

    pub fn with_root(root: impl Into<PathBuf>, archive: bool) -> Self {
        Self {
            root: root.into(),
            archive,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn archive_dir(&self) -> PathBuf {
        self.root.join(ARCHIVE_DIR)
    }
}

impl FileStore for LocalFileStore {
    fn import_file(&self, source: &Path, category: &str, label: &str) -> StorageResult<PathBuf> {
        if !source.is_file() {
            return Err(StorageError::NotFound {
                path: source.to_path_buf(),
            });
        }

        let category = category.trim().to_lowercase();
        if category == ARCHIVE_DIR || !is_file_name(&category) {
            return Err(StorageError::InvalidName(category));
        }
        if !is_file_name(label) {
            return Err(StorageError::InvalidName(label.to_string()));
        }

        let dir = self.root.join(category);
        create_dir(&dir)?;

        let file_name = match source.extension() {
            Some(ext) => format!("{}.{}", label, ext.to_string_lossy()),
            None => label.to_string(),
        };
        let target = dir.join(file_name);

        fs::copy(source, &target).map_err(|e| StorageError::from_io(e, target.clone()))?;
        debug!("Imported {:?} to {:?}", source, target);

        fs::canonicalize(&target).map_err(|e| StorageError::from_read(e, target))
    }

    fn archive_or_delete(&self, path: &Path) -> StorageResult<()> {
        if !path.exists() {
            warn!("Document {:?} is already gone", path);
            return Ok(());
        }

        if !self.archive {
            fs::remove_file(path).map_err(|e| StorageError::from_io(e, path.to_path_buf()))?;
            debug!("Deleted {:?}", path);
            return Ok(());
        }

        let dir = self.archive_dir();
        create_dir(&dir)?;
        let target = unique_path(&dir, path);

        if fs::rename(path, &target).is_err() {
            // rename fails across filesystems
            fs::copy(path, &target).map_err(|e| StorageError::from_io(e, target.clone()))?;
            fs::remove_file(path).map_err(|e| StorageError::from_io(e, path.to_path_buf()))?;
        }
        debug!("Archived {:?} to {:?}", path, target);
        Ok(())
    }
}

/// True if `name` is a single plain path component
fn is_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !name.contains(['/', '\\'])
}

fn create_dir(dir: &Path) -> StorageResult<()> {
    fs::create_dir_all(dir).map_err(|source| StorageError::CreateDirectory {
        path: dir.to_path_buf(),
        source,
    })
}

/// `dir/<file name of path>`, numbered if that name is taken
fn unique_path(dir: &Path, path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    let mut target = dir.join(&name);
    let mut n = 1;
    while target.exists() {
        target = dir.join(format!("{}.{}", name, n));
        n += 1;
    }
    target
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn source_file(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, b"%PDF-1.4").unwrap();
        path
    }

    #[test]
    fn test_import_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalFileStore::with_root(temp_dir.path().join("files"), true);
        let source = source_file(&temp_dir, "paper.pdf");

        let stored = store
            .import_file(&source, "Neutrino", "PhysicalReviewD_5_012345_2020")
            .unwrap();

        assert!(stored.is_absolute());
        assert!(stored.ends_with("neutrino/PhysicalReviewD_5_012345_2020.pdf"));
        assert_eq!(fs::read(&stored).unwrap(), b"%PDF-1.4");
        assert!(source.exists());
    }

    #[test]
    fn test_import_without_extension() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalFileStore::with_root(temp_dir.path().join("files"), true);
        let source = source_file(&temp_dir, "README");

        let stored = store.import_file(&source, "notes", "Readme_2020").unwrap();
        assert!(stored.ends_with("notes/Readme_2020"));
    }

    #[test]
    fn test_import_missing_source() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalFileStore::with_root(temp_dir.path().join("files"), true);
        let err = store
            .import_file(&temp_dir.path().join("missing.pdf"), "x", "y")
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound { .. }));
    }

    #[test]
    fn test_import_stays_inside_root() {
        let temp_dir = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        let store = LocalFileStore::with_root(temp_dir.path().join("files"), true);
        let source = source_file(&temp_dir, "paper.pdf");

        let absolute = outside.path().to_string_lossy().into_owned();
        for category in [absolute.as_str(), "../../escape", "a/b", "..", "", "Archive"] {
            let err = store
                .import_file(&source, category, "Label_2020")
                .unwrap_err();
            assert!(
                matches!(err, StorageError::InvalidName(_)),
                "category {:?} was accepted",
                category
            );
        }

        let err = store.import_file(&source, "physics", "A/B_5_1_2020").unwrap_err();
        assert!(matches!(err, StorageError::InvalidName(_)));

        assert_eq!(fs::read_dir(outside.path()).unwrap().count(), 0);
        assert!(!store.root().exists());
    }

    #[test]
    fn test_archive() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalFileStore::with_root(temp_dir.path().join("files"), true);
        let first = source_file(&temp_dir, "a.pdf");
        store.archive_or_delete(&first).unwrap();
        assert!(!first.exists());
        assert!(store.root().join(ARCHIVE_DIR).join("a.pdf").exists());

        // Same name again gets a numbered copy
        let second = source_file(&temp_dir, "a.pdf");
        store.archive_or_delete(&second).unwrap();
        assert!(store.root().join("archive").join("a.pdf.1").exists());
    }

    #[test]
    fn test_delete() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalFileStore::with_root(temp_dir.path().join("files"), false);
        let path = source_file(&temp_dir, "a.pdf");
        store.archive_or_delete(&path).unwrap();
        assert!(!path.exists());
        assert!(!store.root().join("archive").exists());
    }

    #[test]
    fn test_missing_document_is_noop() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalFileStore::with_root(temp_dir.path().join("files"), true);
        store
            .archive_or_delete(&temp_dir.path().join("gone.pdf"))
            .unwrap();
    }
}
