//! List, open and summary command handlers

use anyhow::{Context, Result};
use tracing::debug;

use litman_core::{Criteria, Store};

use crate::output::{ListStyle, Output};

/// List references matching `criteria`
pub fn list(store: &Store, criteria: Criteria, style: ListStyle, output: &Output) -> Result<()> {
    let references = store.query(&criteria)?;
    output.print_references(store.library(), &references, style)
}

/// Open the documents of matching references
///
/// Only the first match is opened unless `all` is set.
pub fn open(store: &Store, criteria: Criteria, all: bool, output: &Output) -> Result<()> {
    let references = store.query(&criteria)?;
    if references.is_empty() {
        output.message("No references found.");
        return Ok(());
    }

    let selected = if all {
        &references[..]
    } else {
        &references[..1]
    };

    for reference in selected {
        match reference.file {
            Some(ref file) => {
                debug!("Opening {:?}", file);
                open::that(file).with_context(|| format!("Failed to open {:?}", file))?;
                output.success(&format!("Opened {}", reference.label()));
            }
            None => output.message(&format!("{} has no document", reference.label())),
        }
    }
    Ok(())
}

/// Show library counts
pub fn summary(store: &Store, output: &Output) -> Result<()> {
    output.print_summary(&store.summary(), &store.check_integrity())
}
