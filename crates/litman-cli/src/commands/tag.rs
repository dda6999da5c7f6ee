//! Tag command handlers

use anyhow::Result;

use litman_core::Store;

use crate::output::Output;

/// List all tags with usage counts
pub fn list(store: &Store, output: &Output) -> Result<()> {
    let tags: Vec<(String, usize)> = store.summary().tags.into_iter().collect();
    output.print_tags(&tags)
}
