//! Reference command handlers

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use litman_core::{MarkFlags, Reference, ReferenceEdit, ReferenceFields, ReferenceKind, Store};

use crate::editor::{edit_text, note_from_text, proceed};
use crate::output::Output;

/// Add a new reference
pub fn add(
    store: &mut Store,
    kind: ReferenceKind,
    fields: ReferenceFields,
    file: Option<PathBuf>,
    keep_original: bool,
    output: &Output,
) -> Result<()> {
    let keep_original = keep_original || store.config().keep_original;
    let reference = store
        .add(kind, fields, file.as_deref(), keep_original)
        .context("Failed to add reference")?;

    if !output.is_json() {
        output.success(&format!("Added {}", reference.label()));
    }
    output.print_reference(store.library(), &reference)
}

/// Edit fields, tags and notes of a reference
///
/// All changes are saved together; any failure leaves the reference as it was.
pub fn edit(store: &mut Store, label: String, edit: ReferenceEdit, output: &Output) -> Result<()> {
    if edit.is_empty() {
        bail!("Nothing to edit. Pass a field to replace, --add-tag, --rm-tag or --rm-note.");
    }

    if let Some(what) = removal_prompt(store.get(&label)?, &edit) {
        if !proceed(output, &what)? {
            return Ok(());
        }
    }

    store
        .edit(&label, &edit)
        .with_context(|| format!("Failed to edit {}", label))?;

    if !output.is_json() {
        output.success(&format!("Updated {}", label));
    }
    output.print_reference(store.library(), store.get(&label)?)
}

/// Describe the tag and note removals of an edit, if it has any
fn removal_prompt(current: &Reference, edit: &ReferenceEdit) -> Option<String> {
    let mut parts = Vec::new();
    if !edit.remove_tags.is_empty() {
        parts.push(format!("remove tag(s) {}", edit.remove_tags.join(", ")));
    }
    if let Some(index) = edit.remove_note {
        match current.notes.get(index) {
            Some(note) => parts.push(format!("remove note {}: {}", index, note)),
            None => parts.push(format!("remove note {}", index)),
        }
    }
    if parts.is_empty() {
        return None;
    }
    Some(format!("Edit {}: {}", current.label(), parts.join("; ")))
}

/// Set status flags on a reference
pub fn mark(store: &mut Store, label: String, flags: MarkFlags, output: &Output) -> Result<()> {
    if flags == MarkFlags::default() {
        bail!("Nothing to mark. Pass --important, --printed, --to-read or --read.");
    }
    store.mark(&label, flags)?;
    output.success(&format!("Marked {}", label));
    Ok(())
}

/// Append notes, or write one in $EDITOR when none are given
pub fn note(store: &mut Store, label: String, notes: Vec<String>, output: &Output) -> Result<()> {
    let notes = if notes.is_empty() {
        let title = store.get(&label)?.title.clone();
        let template = format!(
            "# Note for {}: {}\n# Lines starting with # are ignored.\n",
            label, title
        );
        match note_from_text(&edit_text(&template)?) {
            Some(note) => vec![note],
            None => {
                output.message("Empty note, nothing added.");
                return Ok(());
            }
        }
    } else {
        notes
    };

    let count = notes.len();
    store.add_notes(&label, notes)?;
    output.success(&format!("Added {} note(s) to {}", count, label));
    Ok(())
}

/// Remove a reference and its links
pub fn remove(store: &mut Store, label: String, output: &Output) -> Result<()> {
    let reference = store.get(&label)?;
    let mut what = format!("Remove {}: {}", label, reference.title);
    let links = reference.references().len() + reference.citations().len();
    if links > 0 {
        what.push_str(&format!(" ({} link(s) will be removed)", links));
    }

    if !proceed(output, &what)? {
        return Ok(());
    }

    let removed = store
        .remove(&label)
        .with_context(|| format!("Failed to remove {}", label))?;

    output.success(&format!("Removed {}", label));
    if let Some(file) = removed.file {
        let fate = if store.config().archive_removed {
            "Archived"
        } else {
            "Deleted"
        };
        output.message(&format!("{} {}", fate, file.display()));
    }
    Ok(())
}
