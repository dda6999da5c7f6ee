//! Citation link command handlers

use anyhow::{bail, Context, Result};

use litman_core::Store;

use crate::editor::proceed;
use crate::output::Output;

/// Record that `reference` cites `cited`
pub fn link(store: &mut Store, reference: String, cited: String, output: &Output) -> Result<()> {
    store
        .link(&reference, &cited)
        .with_context(|| format!("Failed to link {} to {}", reference, cited))?;
    output.success(&format!("{} now cites {}", reference, cited));
    Ok(())
}

/// Remove one edge by its position in `label`'s references or citations
pub fn unlink(
    store: &mut Store,
    label: String,
    reference: Option<usize>,
    citation: Option<usize>,
    output: &Output,
) -> Result<()> {
    let (index, list) = match (reference, citation) {
        (Some(index), None) => (index, "references"),
        (None, Some(index)) => (index, "citations"),
        _ => bail!("Pass exactly one of --reference or --citation"),
    };

    let entry = store.get(&label)?;
    let edges = if reference.is_some() {
        entry.references()
    } else {
        entry.citations()
    };
    if let Some(other) = edges.get(index) {
        let what = format!("Unlink {} from {} ({} {})", other, label, list, index);
        if !proceed(output, &what)? {
            return Ok(());
        }
    }

    let other = if reference.is_some() {
        store.unlink_reference(&label, index)?
    } else {
        store.unlink_citation(&label, index)?
    };
    output.success(&format!("Unlinked {} from {}", other, label));
    Ok(())
}
