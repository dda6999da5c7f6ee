//! SQLite cache of the library
//!
//! Decoding CBOR rows is faster than parsing the pretty-printed JSON file,
//! so the cache is what normal commands load from. It records the stamp of
//! the library file it was built from; a cache whose stamp does not match
//! the file on disk is ignored.

use std::path::Path;

use rusqlite::{params, Connection};

use crate::library::Library;
use crate::models::Reference;
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::schema::{get_info, init_schema, needs_init, set_info, SOURCE_STAMP_KEY};

/// SQLite-backed library cache
pub struct SqliteCache {
    conn: Connection,
}

impl SqliteCache {
    /// Open or create the cache database
    pub fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StorageError::CreateDirectory {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open(path)?;
        if needs_init(&conn) {
            conn.execute_batch("DROP TABLE IF EXISTS entries;")?;
            init_schema(&conn)?;
        }

        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Stamp of the library file this cache was built from
    pub fn source_stamp(&self) -> StorageResult<Option<String>> {
        Ok(get_info(&self.conn, SOURCE_STAMP_KEY)?)
    }

    /// Replace the cache contents with `library`
    ///
    /// Runs in a transaction; a failure leaves the previous contents.
    pub fn project_full(&mut self, library: &Library, stamp: &str) -> StorageResult<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM entries", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO entries (label, kind, year, record) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for reference in library.iter() {
                let record = encode(reference)?;
                stmt.execute(params![
                    reference.label(),
                    reference.kind().as_str(),
                    reference.year,
                    record
                ])?;
            }
        }
        set_info(&tx, SOURCE_STAMP_KEY, stamp)?;
        tx.commit()?;
        Ok(())
    }

    /// Decode every cached reference
    pub fn load(&self) -> StorageResult<Library> {
        let mut stmt = self
            .conn
            .prepare("SELECT record FROM entries ORDER BY label")?;
        let rows = stmt.query_map([], |row| row.get::<_, Vec<u8>>(0))?;

        let mut references = Vec::new();
        for row in rows {
            references.push(decode(&row?)?);
        }
        Ok(references.into_iter().collect())
    }
}

fn encode(reference: &Reference) -> StorageResult<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::into_writer(reference, &mut buf)
        .map_err(|e| StorageError::Encoding(format!("{}: {}", reference.label(), e)))?;
    Ok(buf)
}

fn decode(bytes: &[u8]) -> StorageResult<Reference> {
    ciborium::from_reader(bytes).map_err(|e| StorageError::Encoding(e.to_string()))
}
