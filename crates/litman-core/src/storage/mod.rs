//! Storage layer
//!
//! Handles library persistence and the SQLite cache.
//!
//! ## Architecture
//!
//! - **JSON file**: Source of truth, rewritten whole on every save
//! - **SQLite**: Derived cache of CBOR records for fast loading
//!
//! The rest of the crate only sees the `CollectionStore` trait.

pub mod cache;
pub mod error;
pub mod persistence;
pub mod schema;

pub use cache::SqliteCache;
pub use error::{StorageError, StorageResult};
pub use persistence::LibraryPersistence;
pub use schema::{init_schema, needs_init, SCHEMA_VERSION};

use crate::library::Library;

/// Whole-collection load/save
pub trait CollectionStore {
    /// Load the library; `None` if nothing has been saved yet
    fn load(&self) -> StorageResult<Option<Library>>;

    /// Replace the stored library with `library`
    fn save(&self, library: &Library) -> StorageResult<()>;
}
