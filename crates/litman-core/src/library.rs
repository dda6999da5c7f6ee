//! The reference collection and its citation graph
//!
//! A `Library` maps labels to references. Citation links are stored on both
//! ends: `a.references` lists what `a` cites and `b.citations` lists who
//! cites `b`. Every mutation here either succeeds completely or leaves the
//! library untouched.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::{MarkFlags, Reference, ReferenceEdit, ReferenceKind};
use crate::winnow::{winnow, Criteria};

/// Which edge list of a reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    References,
    Citations,
}

impl Side {
    fn name(self) -> &'static str {
        match self {
            Side::References => "references",
            Side::Citations => "citations",
        }
    }

    fn mirror(self) -> Side {
        match self {
            Side::References => Side::Citations,
            Side::Citations => Side::References,
        }
    }

    fn list(self, reference: &Reference) -> &Vec<String> {
        match self {
            Side::References => &reference.references,
            Side::Citations => &reference.citations,
        }
    }

    fn list_mut(self, reference: &mut Reference) -> &mut Vec<String> {
        match self {
            Side::References => &mut reference.references,
            Side::Citations => &mut reference.citations,
        }
    }
}

/// Collection of references keyed by label
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Library {
    references: BTreeMap<String, Reference>,
}

impl Library {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.references.len()
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.references.contains_key(label)
    }

    pub fn get(&self, label: &str) -> Option<&Reference> {
        self.references.get(label)
    }

    /// Like `get`, but a missing label is an error
    pub fn require(&self, label: &str) -> Result<&Reference> {
        self.references
            .get(label)
            .ok_or_else(|| Error::ReferenceNotFound(label.to_string()))
    }

    fn require_mut(&mut self, label: &str) -> Result<&mut Reference> {
        self.references
            .get_mut(label)
            .ok_or_else(|| Error::ReferenceNotFound(label.to_string()))
    }

    /// All references, ordered by label
    pub fn iter(&self) -> impl Iterator<Item = &Reference> {
        self.references.values()
    }

    /// Filter the library (see [`winnow`])
    pub fn winnow(&self, criteria: &Criteria) -> Result<Vec<&Reference>> {
        winnow(Some(self), criteria)
    }

    // ==================== Add / Edit ====================

    /// Add a new reference. Fails if its label is already taken.
    pub fn insert(&mut self, reference: Reference) -> Result<()> {
        if self.contains(reference.label()) {
            return Err(Error::Duplicate(reference.label().to_string()));
        }
        self.references
            .insert(reference.label().to_string(), reference);
        Ok(())
    }

    pub fn edit(&mut self, label: &str, edit: &ReferenceEdit) -> Result<()> {
        self.require_mut(label)?.apply_edit(edit)
    }

    pub fn add_tag(&mut self, label: &str, tag: &str) -> Result<bool> {
        self.require_mut(label)?.add_tag(tag)
    }

    pub fn remove_tag(&mut self, label: &str, tag: &str) -> Result<()> {
        self.require_mut(label)?.remove_tag(tag)
    }

    pub fn add_notes<I, S>(&mut self, label: &str, notes: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.require_mut(label)?.add_notes(notes);
        Ok(())
    }

    pub fn remove_note(&mut self, label: &str, index: usize) -> Result<String> {
        self.require_mut(label)?.remove_note(index)
    }

    pub fn mark(&mut self, label: &str, flags: MarkFlags) -> Result<()> {
        self.require_mut(label)?.mark(flags);
        Ok(())
    }

    // ==================== Link Graph ====================

    /// Record that `reference` cites `cited`
    ///
    /// Linking the same pair twice stores the edge twice.
    pub fn link(&mut self, reference: &str, cited: &str) -> Result<()> {
        self.require(reference)?;
        self.require(cited)?;

        self.require_mut(reference)?
            .references
            .push(cited.to_string());
        self.require_mut(cited)?
            .citations
            .push(reference.to_string());
        Ok(())
    }

    /// Remove the `index`-th entry of `label`'s references and its mirror
    ///
    /// Returns the label that was unlinked.
    pub fn unlink_reference(&mut self, label: &str, index: usize) -> Result<String> {
        self.unlink(label, index, Side::References)
    }

    /// Remove the `index`-th entry of `label`'s citations and its mirror
    pub fn unlink_citation(&mut self, label: &str, index: usize) -> Result<String> {
        self.unlink(label, index, Side::Citations)
    }

    fn unlink(&mut self, label: &str, index: usize, side: Side) -> Result<String> {
        let mut source = self.require(label)?.clone();
        let list = side.list_mut(&mut source);
        if index >= list.len() {
            return Err(Error::Index {
                label: label.to_string(),
                list: side.name(),
                index,
                len: list.len(),
            });
        }
        let other = list.remove(index);

        if other == label {
            remove_one(side.mirror().list_mut(&mut source), label)
                .ok_or_else(|| missing_mirror(label, &other, side))?;
            self.references.insert(label.to_string(), source);
            return Ok(other);
        }

        let mut target = self.require(&other)?.clone();
        remove_one(side.mirror().list_mut(&mut target), label)
            .ok_or_else(|| missing_mirror(label, &other, side))?;

        self.references.insert(label.to_string(), source);
        self.references.insert(other.clone(), target);
        Ok(other)
    }

    // ==================== Remove ====================

    /// Remove a reference and every citation edge touching it
    ///
    /// Each edge listed on the doomed entry is removed from the other end.
    /// If any other entry still points at the label afterwards, the graph
    /// was already inconsistent and nothing is removed.
    pub fn remove(&mut self, label: &str) -> Result<Reference> {
        let doomed = self.require(label)?.clone();
        let mut staged = self.references.clone();
        staged.remove(label);

        for side in [Side::References, Side::Citations] {
            for other in side.list(&doomed) {
                if other == label {
                    continue;
                }
                let target = staged.get_mut(other).ok_or_else(|| {
                    Error::Corruption(format!(
                        "{} lists '{}' in its {}, but it does not exist",
                        label,
                        other,
                        side.name()
                    ))
                })?;
                remove_one(side.mirror().list_mut(target), label)
                    .ok_or_else(|| missing_mirror(label, other, side))?;
            }
        }

        if let Some(stale) = staged.values().find(|r| {
            r.references.iter().any(|l| l == label) || r.citations.iter().any(|l| l == label)
        }) {
            return Err(Error::Corruption(format!(
                "{} still links to {} without a matching edge",
                stale.label(),
                label
            )));
        }

        self.references = staged;
        Ok(doomed)
    }

    // ==================== Inspection ====================

    /// Counts over the whole library
    pub fn summary(&self) -> LibrarySummary {
        let mut summary = LibrarySummary {
            total: self.len(),
            ..Default::default()
        };
        for reference in self.iter() {
            *summary.by_kind.entry(reference.kind()).or_default() += 1;
            *summary
                .by_category
                .entry(reference.category.to_lowercase())
                .or_default() += 1;
            for tag in &reference.tags {
                *summary.tags.entry(tag.clone()).or_default() += 1;
            }
            if reference.important {
                summary.important += 1;
            }
            if reference.printed {
                summary.printed += 1;
            }
            if reference.read {
                summary.read += 1;
            } else {
                summary.to_read += 1;
            }
            summary.links += reference.references.len();
        }
        summary
    }

    /// Describe every broken invariant of the stored graph
    ///
    /// An empty result means keys match labels, every edge target exists and
    /// every edge has the same multiplicity on both ends.
    pub fn check_integrity(&self) -> Vec<String> {
        let mut problems = Vec::new();
        for (key, reference) in &self.references {
            if key != reference.label() {
                problems.push(format!(
                    "entry stored under '{}' has label '{}'",
                    key,
                    reference.label()
                ));
            }
            if !reference
                .tags
                .contains(&reference.category.to_lowercase())
            {
                problems.push(format!("{} is missing its category tag", key));
            }
            for side in [Side::References, Side::Citations] {
                for other in side.list(reference) {
                    let Some(target) = self.references.get(other) else {
                        problems.push(format!(
                            "{} lists missing '{}' in its {}",
                            key,
                            other,
                            side.name()
                        ));
                        continue;
                    };
                    let here = side.list(reference).iter().filter(|l| *l == other).count();
                    let there = side
                        .mirror()
                        .list(target)
                        .iter()
                        .filter(|l| *l == key)
                        .count();
                    match side {
                        Side::References if here != there => problems.push(format!(
                            "{} cites {} {} time(s) but is listed {} time(s) in its citations",
                            key, other, here, there
                        )),
                        // a partial mismatch was already reported from the citing side
                        Side::Citations if there == 0 => problems.push(format!(
                            "{} lists {} in its citations but is not in its references",
                            key, other
                        )),
                        _ => {}
                    }
                }
            }
        }
        problems.dedup();
        problems
    }
}

impl FromIterator<Reference> for Library {
    /// Collect references; a later entry with a taken label replaces the earlier one
    fn from_iter<T: IntoIterator<Item = Reference>>(iter: T) -> Self {
        Self {
            references: iter
                .into_iter()
                .map(|r| (r.label().to_string(), r))
                .collect(),
        }
    }
}

/// Counts reported by the `summary` command
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LibrarySummary {
    pub total: usize,
    pub by_kind: BTreeMap<ReferenceKind, usize>,
    pub by_category: BTreeMap<String, usize>,
    pub tags: BTreeMap<String, usize>,
    pub important: usize,
    pub printed: usize,
    pub read: usize,
    pub to_read: usize,
    /// Number of citation edges
    pub links: usize,
}

fn remove_one(list: &mut Vec<String>, label: &str) -> Option<String> {
    let pos = list.iter().position(|l| l == label)?;
    Some(list.remove(pos))
}

fn missing_mirror(label: &str, other: &str, side: Side) -> Error {
    Error::Corruption(format!(
        "{} lists '{}' in its {}, but '{}' has no matching entry in its {}",
        label,
        other,
        side.name(),
        other,
        side.mirror().name()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::{article, book};
    use crate::models::ReferenceEdit;

    const ART: &str = "PhysicalReviewD_5_012345_2020";
    const BOOK: &str = "Deep_1Edition_Press";

    fn library() -> Library {
        let mut library = Library::new();
        library
            .insert(article("Physical Review D", 5, "012345", 2020))
            .unwrap();
        library.insert(book("Deep", 1, "Press")).unwrap();
        library
            .insert(article("Nature", 7, "100", 2023))
            .unwrap();
        library
    }

    #[test]
    fn test_insert_duplicate() {
        let mut library = library();
        let err = library
            .insert(article("Physical Review D", 5, "012345", 2020))
            .unwrap_err();
        assert_eq!(err, Error::Duplicate(ART.to_string()));
        assert_eq!(library.len(), 3);
    }

    #[test]
    fn test_link_mirrors_edge() {
        let mut library = library();
        library.link(ART, BOOK).unwrap();

        assert_eq!(library.get(ART).unwrap().references, vec![BOOK]);
        assert_eq!(library.get(BOOK).unwrap().citations, vec![ART]);
        assert!(library.check_integrity().is_empty());
    }

    #[test]
    fn test_link_missing_label() {
        let mut library = library();
        let before = library.clone();
        let err = library.link(ART, "Nope_1").unwrap_err();
        assert_eq!(err, Error::ReferenceNotFound("Nope_1".to_string()));
        assert_eq!(library, before);
    }

    #[test]
    fn test_link_twice_keeps_duplicates() {
        let mut library = library();
        library.link(ART, BOOK).unwrap();
        library.link(ART, BOOK).unwrap();
        assert_eq!(library.get(ART).unwrap().references, vec![BOOK, BOOK]);
        assert_eq!(library.get(BOOK).unwrap().citations, vec![ART, ART]);
        assert!(library.check_integrity().is_empty());
    }

    #[test]
    fn test_unlink_reference_restores_state() {
        let mut library = library();
        let before = library.clone();
        library.link(ART, BOOK).unwrap();

        let removed = library.unlink_reference(ART, 0).unwrap();
        assert_eq!(removed, BOOK);
        assert_eq!(library, before);
    }

    #[test]
    fn test_unlink_citation() {
        let mut library = library();
        library.link(ART, BOOK).unwrap();
        let removed = library.unlink_citation(BOOK, 0).unwrap();
        assert_eq!(removed, ART);
        assert!(library.get(ART).unwrap().references.is_empty());
        assert!(library.get(BOOK).unwrap().citations.is_empty());
    }

    #[test]
    fn test_unlink_index_out_of_range() {
        let mut library = library();
        library.link(ART, BOOK).unwrap();
        let err = library.unlink_reference(ART, 1).unwrap_err();
        assert!(matches!(err, Error::Index { index: 1, len: 1, .. }));
        assert_eq!(library.get(ART).unwrap().references, vec![BOOK]);
    }

    #[test]
    fn test_unlink_self_citation() {
        let mut library = library();
        library.link(ART, ART).unwrap();
        library.unlink_reference(ART, 0).unwrap();
        let entry = library.get(ART).unwrap();
        assert!(entry.references.is_empty());
        assert!(entry.citations.is_empty());
    }

    #[test]
    fn test_unlink_detects_missing_mirror() {
        let mut library = library();
        library
            .references
            .get_mut(ART)
            .unwrap()
            .references
            .push(BOOK.to_string());
        let before = library.clone();

        let err = library.unlink_reference(ART, 0).unwrap_err();
        assert!(matches!(err, Error::Corruption(_)));
        assert_eq!(library, before);
    }

    #[test]
    fn test_unlink_mirror_label_gone() {
        let mut library = library();
        library
            .references
            .get_mut(ART)
            .unwrap()
            .references
            .push("Gone_2000".to_string());
        let err = library.unlink_reference(ART, 0).unwrap_err();
        assert_eq!(err, Error::ReferenceNotFound("Gone_2000".to_string()));
    }

    #[test]
    fn test_remove_cleans_edges() {
        let mut library = library();
        let nature = "Nature_7_100_2023";
        library.link(ART, BOOK).unwrap();
        library.link(nature, ART).unwrap();
        library.link(ART, BOOK).unwrap();

        let removed = library.remove(ART).unwrap();
        assert_eq!(removed.label(), ART);
        assert!(!library.contains(ART));
        assert!(library.get(BOOK).unwrap().citations.is_empty());
        assert!(library.get(nature).unwrap().references.is_empty());
        assert!(library.check_integrity().is_empty());
    }

    #[test]
    fn test_remove_with_self_link() {
        let mut library = library();
        library.link(ART, ART).unwrap();
        library.remove(ART).unwrap();
        assert_eq!(library.len(), 2);
    }

    #[test]
    fn test_remove_aborts_on_stale_edge() {
        let mut library = library();
        library
            .references
            .get_mut(BOOK)
            .unwrap()
            .references
            .push(ART.to_string());
        let before = library.clone();

        let err = library.remove(ART).unwrap_err();
        assert!(matches!(err, Error::Corruption(_)));
        assert_eq!(library, before);
    }

    #[test]
    fn test_remove_missing() {
        let mut library = library();
        assert!(library.remove("Nope").unwrap_err().is_not_found());
    }

    #[test]
    fn test_mutations_on_missing_label() {
        let mut library = library();
        assert!(library.add_tag("Nope", "x").unwrap_err().is_not_found());
        assert!(library.add_notes("Nope", ["x"]).unwrap_err().is_not_found());
        assert!(library
            .mark("Nope", MarkFlags::default())
            .unwrap_err()
            .is_not_found());
        assert!(library
            .edit("Nope", &ReferenceEdit::default())
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_tags_and_notes() {
        let mut library = library();
        library.add_tag(BOOK, "Reading-Group").unwrap();
        library.remove_tag(BOOK, "reading-group").unwrap();
        let err = library.remove_tag(BOOK, "reading-group").unwrap_err();
        assert!(matches!(err, Error::TagNotFound { .. }));

        library.add_notes(BOOK, ["chapter 2 is key"]).unwrap();
        assert_eq!(library.remove_note(BOOK, 0).unwrap(), "chapter 2 is key");
        assert!(matches!(
            library.remove_note(BOOK, 0).unwrap_err(),
            Error::Index { .. }
        ));
    }

    #[test]
    fn test_summary() {
        let mut library = library();
        library.link(ART, BOOK).unwrap();
        library
            .mark(
                BOOK,
                MarkFlags {
                    read: true,
                    important: true,
                    ..Default::default()
                },
            )
            .unwrap();

        let summary = library.summary();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.by_kind[&ReferenceKind::Article], 2);
        assert_eq!(summary.by_kind[&ReferenceKind::Book], 1);
        assert_eq!(summary.by_category["physics"], 2);
        assert_eq!(summary.important, 1);
        assert_eq!(summary.read, 1);
        assert_eq!(summary.to_read, 2);
        assert_eq!(summary.links, 1);
    }

    #[test]
    fn test_check_integrity_reports_asymmetry() {
        let mut library = library();
        library
            .references
            .get_mut(ART)
            .unwrap()
            .references
            .push(BOOK.to_string());
        let problems = library.check_integrity();
        assert_eq!(problems.len(), 1);
        assert!(problems[0].contains("cites"));
    }

    #[test]
    fn test_serde_transparent() {
        let library = library();
        let json = serde_json::to_string(&library).unwrap();
        assert!(json.starts_with("{\"Deep_1Edition_Press\""));
        let parsed: Library = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, library);
    }
}
