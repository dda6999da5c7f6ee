//! Library persistence
//!
//! The library is stored as a pretty-printed JSON object mapping labels to
//! references. Every save rewrites the whole file using atomic writes
//! (write to temp file, then rename) and rebuilds the SQLite cache.
//!
//! Storage location: `~/.local/share/litman/` (configurable via `Config`)
//!
//! Files:
//! - `litman.json` - The library (source of truth)
//! - `litman.db` - SQLite cache derived from `litman.json`
//! - `backups/` - Timestamped copies of `litman.json`

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use chrono::Local;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::library::Library;
use crate::storage::cache::SqliteCache;
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::CollectionStore;

/// Persistence layer for the library file and its cache
pub struct LibraryPersistence {
    config: Config,
    use_cache: bool,
}

impl LibraryPersistence {
    /// Create a new persistence handler with the given configuration
    pub fn new(config: Config) -> Self {
        let use_cache = config.use_cache;
        Self { config, use_cache }
    }

    /// Always read the library file, ignoring the cache
    pub fn without_cache(mut self) -> Self {
        self.use_cache = false;
        self
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Check if a library file exists on disk
    pub fn exists(&self) -> bool {
        self.config.library_path().exists()
    }

    /// Load the library from the JSON file, bypassing the cache
    ///
    /// Returns `None` if the file doesn't exist.
    pub fn load_from_source(&self) -> StorageResult<Option<Library>> {
        let path = self.config.library_path();

        if !path.exists() {
            return Ok(None);
        }

        let content =
            fs::read_to_string(&path).map_err(|e| StorageError::from_read(e, path.clone()))?;
        if content.trim().is_empty() {
            return Ok(Some(Library::new()));
        }

        let library = serde_json::from_str(&content).map_err(|e| StorageError::CorruptLibrary {
            path: path.clone(),
            details: e.to_string(),
        })?;
        Ok(Some(library))
    }

    /// Load the library through the cache, if it is fresh
    fn load_from_cache(&self) -> StorageResult<Option<Library>> {
        let cache_path = self.config.cache_path();
        let Some(stamp) = source_stamp(&self.config.library_path())? else {
            return Ok(None);
        };
        if !cache_path.exists() {
            return Ok(None);
        }

        let cache = SqliteCache::open(&cache_path)?;
        if cache.source_stamp()?.as_deref() != Some(stamp.as_str()) {
            debug!("Cache is stale, ignoring {:?}", cache_path);
            return Ok(None);
        }
        Ok(Some(cache.load()?))
    }

    /// Rebuild the cache from `library`, stamped with the current library file
    ///
    /// Returns the number of cached entries.
    pub fn rebuild_cache(&self, library: &Library) -> StorageResult<usize> {
        let stamp = source_stamp(&self.config.library_path())?.unwrap_or_default();
        let mut cache = SqliteCache::open(&self.config.cache_path())?;
        cache.project_full(library, &stamp)?;
        debug!("Cached {} entries", library.len());
        Ok(library.len())
    }

    /// Copy the library file into the backup directory
    ///
    /// Returns the path of the new backup.
    pub fn backup(&self) -> StorageResult<PathBuf> {
        let source = self.config.library_path();
        if !source.exists() {
            return Err(StorageError::NotFound { path: source });
        }

        let dir = self.config.backup_dir();
        fs::create_dir_all(&dir).map_err(|e| StorageError::CreateDirectory {
            path: dir.clone(),
            source: e,
        })?;

        let stamp = Local::now().format("%Y%m%d-%H%M%S");
        let mut target = dir.join(format!("litman-{}.json", stamp));
        let mut n = 1;
        while target.exists() {
            target = dir.join(format!("litman-{}-{}.json", stamp, n));
            n += 1;
        }

        fs::copy(&source, &target).map_err(|e| StorageError::from_io(e, target.clone()))?;
        info!("Backed up library to {:?}", target);
        Ok(target)
    }
}

impl CollectionStore for LibraryPersistence {
    /// Load the library, preferring a fresh cache
    ///
    /// Falls back to the JSON file (and rebuilds the cache) when the cache is
    /// disabled, missing, stale or unreadable.
    fn load(&self) -> StorageResult<Option<Library>> {
        if self.use_cache {
            match self.load_from_cache() {
                Ok(Some(library)) => {
                    debug!("Loaded {} entries from cache", library.len());
                    return Ok(Some(library));
                }
                Ok(None) => {}
                Err(e) => warn!("Ignoring unreadable cache: {}", e),
            }
        }

        let library = self.load_from_source()?;
        if let Some(ref library) = library {
            debug!("Loaded {} entries from {:?}", library.len(), self.config.library_path());
            if self.use_cache {
                if let Err(e) = self.rebuild_cache(library) {
                    warn!("Failed to rebuild cache: {}", e);
                }
            }
        }
        Ok(library)
    }

    /// Rewrite the library file, then refresh the cache
    fn save(&self, library: &Library) -> StorageResult<()> {
        let path = self.config.library_path();
        let json = serde_json::to_vec_pretty(library).map_err(|e| {
            StorageError::Encoding(format!("failed to serialize library: {}", e))
        })?;

        atomic_write(&path, &json)?;
        debug!("Saved {} entries to {:?}", library.len(), path);

        if let Err(e) = self.rebuild_cache(library) {
            // A stale stamp keeps the old cache from being used
            warn!("Failed to refresh cache: {}", e);
        }
        Ok(())
    }
}

/// Size and modification time of the library file, or `None` if it is missing
fn source_stamp(path: &Path) -> StorageResult<Option<String>> {
    let metadata = match fs::metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(StorageError::from_read(e, path.to_path_buf())),
    };
    let modified = metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    Ok(Some(format!("{}:{}", metadata.len(), modified)))
}

/// Write data to a file atomically
///
/// 1. Write to a temporary file in the same directory
/// 2. Sync the file to disk
/// 3. Rename the temp file to the target path
///
/// This ensures the target file is never left in a partially-written state.
pub(crate) fn atomic_write(path: &Path, data: &[u8]) -> StorageResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| StorageError::CreateDirectory {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    let temp_path = path.with_extension("tmp");

    let mut file =
        File::create(&temp_path).map_err(|e| StorageError::from_io(e, temp_path.clone()))?;
    file.write_all(data)
        .map_err(|e| StorageError::from_io(e, temp_path.clone()))?;
    file.sync_all()
        .map_err(|e| StorageError::from_io(e, temp_path.clone()))?;

    fs::rename(&temp_path, path).map_err(|e| StorageError::AtomicWriteFailed {
        from: temp_path.clone(),
        to: path.to_path_buf(),
        source: e,
    })?;

    Ok(())
}
