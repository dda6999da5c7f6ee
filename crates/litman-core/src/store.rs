//! Unified storage interface
//!
//! The `Store` owns the in-memory library for the duration of one command
//! and coordinates between:
//! - the collection store (JSON file + SQLite cache)
//! - the file store (managed documents)
//!
//! Every mutation is applied to the library, then the whole library is
//! saved. If saving fails, the in-memory library is rolled back.
//!
//! ## Usage
//!
//! ```ignore
//! let mut store = Store::open()?;
//!
//! store.add(ReferenceKind::Article, fields, Some(&pdf), false)?;
//! store.link("PhysicalReviewD_5_012345_2020", "Deep_1Edition_Press")?;
//!
//! let unread = store.query(&Criteria { to_read: true, ..Default::default() })?;
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::Error;
use crate::files::{FileStore, LocalFileStore};
use crate::library::{Library, LibrarySummary};
use crate::models::{MarkFlags, Reference, ReferenceEdit, ReferenceFields, ReferenceKind};
use crate::storage::{CollectionStore, LibraryPersistence};
use crate::winnow::Criteria;

/// Unified storage interface for LitMan
pub struct Store {
    /// The loaded library
    library: Library,
    /// Whole-library persistence
    collection: Box<dyn CollectionStore>,
    /// Managed documents
    files: Box<dyn FileStore>,
    /// Configuration
    config: Config,
}

impl Store {
    /// Open the store using the default configuration
    pub fn open() -> Result<Self> {
        let config = Config::load().context("Failed to load configuration")?;
        Self::open_with_config(config)
    }

    /// Open the store with a specific configuration
    pub fn open_with_config(config: Config) -> Result<Self> {
        let collection = Box::new(LibraryPersistence::new(config.clone()));
        let files = Box::new(LocalFileStore::new(&config));
        Self::with_collaborators(config, collection, files)
    }

    /// Open the store with explicit collection and file stores
    pub fn with_collaborators(
        config: Config,
        collection: Box<dyn CollectionStore>,
        files: Box<dyn FileStore>,
    ) -> Result<Self> {
        let library = collection
            .load()
            .context("Failed to load library")?
            .unwrap_or_default();
        debug!("Opened library with {} entries", library.len());

        Ok(Self {
            library,
            collection,
            files,
            config,
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the loaded library
    pub fn library(&self) -> &Library {
        &self.library
    }

    // ==================== Queries ====================

    /// Get a reference by label
    pub fn get(&self, label: &str) -> Result<&Reference> {
        Ok(self.library.require(label)?)
    }

    /// References matching `criteria`
    pub fn query(&self, criteria: &Criteria) -> Result<Vec<&Reference>> {
        Ok(self.library.winnow(criteria)?)
    }

    pub fn summary(&self) -> LibrarySummary {
        self.library.summary()
    }

    // ==================== Add / Edit ====================

    /// Create a reference, import its document and save
    ///
    /// The document is only copied once the label is known to be free.
    pub fn add(
        &mut self,
        kind: ReferenceKind,
        fields: ReferenceFields,
        file: Option<&Path>,
        keep_original: bool,
    ) -> Result<Reference> {
        if let Some(ref category) = fields.category {
            self.check_category(category)?;
        }

        let mut reference = Reference::create(kind, fields)?;
        if self.library.contains(reference.label()) {
            return Err(Error::Duplicate(reference.label().to_string()).into());
        }

        if let Some(source) = file {
            let stored = self
                .files
                .import_file(source, &reference.category, reference.label())
                .with_context(|| format!("Failed to import {:?}", source))?;
            let original = if keep_original {
                Some(absolute(source))
            } else {
                None
            };
            reference.attach_file(stored, original);
        }

        let added = reference.clone();
        let result = self.mutate("add reference", |library| library.insert(reference));
        if result.is_err() {
            if let Some(ref stored) = added.file {
                if let Err(e) = std::fs::remove_file(stored) {
                    warn!("Failed to clean up {:?}: {}", stored, e);
                }
            }
        }
        result?;

        info!("Added {}", added.label());
        Ok(added)
    }

    /// Apply field, tag and note changes together in one save
    pub fn edit(&mut self, label: &str, edit: &ReferenceEdit) -> Result<()> {
        if let Some(ref category) = edit.category {
            self.check_category(category)?;
        }
        self.mutate("edit reference", |library| library.edit(label, edit))
    }

    /// Add a tag; returns false if it was already present
    pub fn add_tag(&mut self, label: &str, tag: &str) -> Result<bool> {
        self.mutate("add tag", |library| library.add_tag(label, tag))
    }

    pub fn remove_tag(&mut self, label: &str, tag: &str) -> Result<()> {
        self.mutate("remove tag", |library| library.remove_tag(label, tag))
    }

    pub fn add_notes(&mut self, label: &str, notes: Vec<String>) -> Result<()> {
        self.mutate("add notes", |library| library.add_notes(label, notes))
    }

    pub fn remove_note(&mut self, label: &str, index: usize) -> Result<String> {
        self.mutate("remove note", |library| library.remove_note(label, index))
    }

    pub fn mark(&mut self, label: &str, flags: MarkFlags) -> Result<()> {
        self.mutate("mark reference", |library| library.mark(label, flags))
    }

    // ==================== Link Graph ====================

    pub fn link(&mut self, reference: &str, cited: &str) -> Result<()> {
        self.mutate("link references", |library| library.link(reference, cited))
    }

    pub fn unlink_reference(&mut self, label: &str, index: usize) -> Result<String> {
        self.mutate("unlink reference", |library| {
            library.unlink_reference(label, index)
        })
    }

    pub fn unlink_citation(&mut self, label: &str, index: usize) -> Result<String> {
        self.mutate("unlink citation", |library| {
            library.unlink_citation(label, index)
        })
    }

    // ==================== Remove ====================

    /// Remove a reference, sever its links and archive its document
    pub fn remove(&mut self, label: &str) -> Result<Reference> {
        let removed = self.mutate("remove reference", |library| library.remove(label))?;

        if let Some(ref file) = removed.file {
            if let Err(e) = self.files.archive_or_delete(file) {
                warn!("Failed to archive {:?}: {}", file, e);
            }
        }
        info!("Removed {}", label);
        Ok(removed)
    }

    // ==================== Maintenance ====================

    /// Reload the library file and rebuild the cache from it
    ///
    /// Returns the number of cached entries.
    pub fn rebuild_cache(&mut self) -> Result<usize> {
        let persistence = LibraryPersistence::new(self.config.clone()).without_cache();
        let library = persistence
            .load_from_source()
            .context("Failed to read library file")?
            .unwrap_or_default();
        let count = persistence
            .rebuild_cache(&library)
            .context("Failed to rebuild cache")?;
        self.library = library;
        Ok(count)
    }

    /// Copy the library file to the backup directory
    pub fn backup(&self) -> Result<PathBuf> {
        LibraryPersistence::new(self.config.clone())
            .backup()
            .context("Failed to back up library")
    }

    /// Broken invariants in the loaded library
    pub fn check_integrity(&self) -> Vec<String> {
        self.library.check_integrity()
    }

    fn check_category(&self, category: &str) -> Result<()> {
        if self.config.allows_category(category) {
            return Ok(());
        }
        Err(Error::Validation {
            field: "category".to_string(),
            message: format!(
                "'{}' is not one of the configured categories ({})",
                category,
                self.config.categories.join(", ")
            ),
        }
        .into())
    }

    /// Apply a library operation and save, rolling back if saving fails
    fn mutate<T>(
        &mut self,
        what: &str,
        op: impl FnOnce(&mut Library) -> crate::Result<T>,
    ) -> Result<T> {
        let previous = self.library.clone();
        let value = op(&mut self.library)?;

        if let Err(e) = self.collection.save(&self.library) {
            self.library = previous;
            return Err(e).with_context(|| format!("Failed to save library after {}", what));
        }
        debug!("Saved library after {}", what);
        Ok(value)
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
