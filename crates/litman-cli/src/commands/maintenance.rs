//! Cache and backup command handlers

use anyhow::Result;

use litman_core::Store;

use crate::output::Output;

/// Rebuild the SQLite cache from the library file
pub fn cache(store: &mut Store, output: &Output) -> Result<()> {
    let count = store.rebuild_cache()?;
    output.success(&format!("Rebuilt cache with {} reference(s)", count));
    Ok(())
}

/// Copy the library file into the backup directory
pub fn backup(store: &Store, output: &Output) -> Result<()> {
    let path = store.backup()?;
    output.success(&format!("Backed up library to {}", path.display()));
    Ok(())
}
