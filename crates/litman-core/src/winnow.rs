//! Winnowing: narrowing a library down by a conjunction of filters
//!
//! Filters run in a fixed order: explicit labels, search terms, authors,
//! categories, then status flags. Only the label step can fail, and it
//! fails before anything else is looked at.

use crate::error::{Error, Result};
use crate::library::Library;
use crate::models::Reference;

/// Filters for a query. Every field is optional; unset fields keep everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Criteria {
    /// Start from exactly these labels instead of the whole library
    pub labels: Option<Vec<String>>,
    /// Every term must match the title, a tag, an author, the journal or the year
    pub search: Option<Vec<String>>,
    /// Every author must appear verbatim in the author list
    pub authors: Option<Vec<String>>,
    /// Category must be one of these (case-insensitive)
    pub categories: Option<Vec<String>>,
    pub important: bool,
    pub printed: bool,
    /// Keep unread entries
    pub to_read: bool,
    /// Keep read entries
    pub read: bool,
}

impl Criteria {
    /// Criteria selecting the given labels
    pub fn labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            labels: Some(labels.into_iter().map(Into::into).collect()),
            ..Default::default()
        }
    }

    /// True if the criteria keep every entry of the library
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Reduce `library` to the references matching `criteria`
///
/// Without explicit labels the result is ordered by label; with them, in
/// the order requested. A missing library yields no entries.
pub fn winnow<'a>(library: Option<&'a Library>, criteria: &Criteria) -> Result<Vec<&'a Reference>> {
    let Some(library) = library else {
        return Ok(Vec::new());
    };

    let mut entries: Vec<&Reference> = match criteria.labels {
        Some(ref labels) => labels
            .iter()
            .map(|label| {
                library
                    .get(label)
                    .ok_or_else(|| Error::ReferenceNotFound(label.clone()))
            })
            .collect::<Result<_>>()?,
        None => library.iter().collect(),
    };

    if let Some(ref terms) = criteria.search {
        entries.retain(|r| terms.iter().all(|term| matches_term(r, term)));
    }

    if let Some(ref authors) = criteria.authors {
        entries.retain(|r| authors.iter().all(|a| r.authors.contains(a)));
    }

    if let Some(ref categories) = criteria.categories {
        entries.retain(|r| {
            categories
                .iter()
                .any(|c| c.trim().to_lowercase() == r.category.to_lowercase())
        });
    }

    if criteria.important {
        entries.retain(|r| r.important);
    }
    if criteria.printed {
        entries.retain(|r| r.printed);
    }
    if criteria.to_read {
        entries.retain(|r| !r.read);
    }
    if criteria.read {
        entries.retain(|r| r.read);
    }

    Ok(entries)
}

fn matches_term(reference: &Reference, term: &str) -> bool {
    let lower = term.to_lowercase();

    reference.title.to_lowercase().contains(&lower)
        || reference.tags.iter().any(|t| t.to_lowercase() == lower)
        || reference
            .authors
            .iter()
            .map(|a| a.to_lowercase())
            .collect::<Vec<_>>()
            .join(" ")
            .contains(&lower)
        || reference
            .details
            .journal()
            .is_some_and(|journal| journal.contains(term))
        || reference.year.to_string().contains(term)
}
