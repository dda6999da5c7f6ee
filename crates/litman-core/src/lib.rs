//! LitMan Core Library
//!
//! This crate provides the core functionality for LitMan, a personal
//! manager for literature references: articles, conference papers, theses,
//! books and notes, with tags, reading status, attached documents and a
//! citation graph between entries.
//!
//! # Architecture
//!
//! - **Library**: In-memory collection keyed by label, owns the citation graph
//! - **JSON file**: Source of truth, rewritten whole on every save
//! - **SQLite**: Derived cache for fast loading
//!
//! # Quick Start
//!
//! ```text
//! let mut store = Store::open()?;
//!
//! // Add an article
//! store.add(ReferenceKind::Article, fields, None, false)?;
//!
//! // Query unread entries
//! let unread = store.query(&Criteria { to_read: true, ..Default::default() })?;
//! ```
//!
//! # Modules
//!
//! - `store`: Unified storage interface (main entry point)
//! - `models`: References and their kind-specific details
//! - `library`: The collection and its citation graph
//! - `winnow`: Filtering a library down to matching entries
//! - `storage`: Library persistence and cache
//! - `files`: Managed documents
//! - `config`: Application configuration

pub mod config;
pub mod error;
pub mod files;
pub mod library;
pub mod models;
pub mod storage;
pub mod store;
pub mod winnow;

pub use config::Config;
pub use error::{Error, Result};
pub use files::{FileStore, LocalFileStore};
pub use library::{Library, LibrarySummary};
pub use models::{
    DetailFields, Details, MarkFlags, Reference, ReferenceEdit, ReferenceFields, ReferenceKind,
};
pub use storage::{CollectionStore, LibraryPersistence, StorageError, StorageResult};
pub use store::Store;
pub use winnow::{winnow, Criteria};
