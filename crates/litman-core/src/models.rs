//! Data models for LitMan
//!
//! A `Reference` is one uniform record: the fields every entry shares plus a
//! `Details` payload holding the fields of its kind. The label is derived
//! from those fields once, at creation, and never changes afterwards.

use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::files::ARCHIVE_DIR;

/// The kinds of reference LitMan tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceKind {
    Article,
    Conference,
    Thesis,
    Book,
    Note,
}

impl ReferenceKind {
    pub const ALL: [ReferenceKind; 5] = [
        ReferenceKind::Article,
        ReferenceKind::Conference,
        ReferenceKind::Thesis,
        ReferenceKind::Book,
        ReferenceKind::Note,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceKind::Article => "article",
            ReferenceKind::Conference => "conference",
            ReferenceKind::Thesis => "thesis",
            ReferenceKind::Book => "book",
            ReferenceKind::Note => "note",
        }
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReferenceKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ReferenceKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::validation("type", format!("unknown reference type '{}'", s)))
    }
}

/// Journal article
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleDetails {
    pub journal: String,
    pub issue: u32,
    pub number: String,
}

/// Conference paper
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConferenceDetails {
    pub conference: String,
    pub location: String,
    pub number: String,
}

/// Thesis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThesisDetails {
    pub university: String,
    pub department: String,
}

/// Book
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookDetails {
    pub publisher: String,
    pub edition: u32,
}

/// Free-standing note (lecture notes, memos, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteDetails {
    pub name: String,
}

/// Kind-specific payload of a reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Details {
    Article(ArticleDetails),
    Conference(ConferenceDetails),
    Thesis(ThesisDetails),
    Book(BookDetails),
    Note(NoteDetails),
}

impl Details {
    /// Build the payload for `kind`, requiring every field the kind needs
    pub fn from_fields(kind: ReferenceKind, fields: &DetailFields) -> Result<Self> {
        let details = match kind {
            ReferenceKind::Article => Details::Article(ArticleDetails {
                journal: required_text("journal", &fields.journal)?,
                issue: fields.issue.ok_or_else(|| Error::missing("issue"))?,
                number: required_text("number", &fields.number)?,
            }),
            ReferenceKind::Conference => Details::Conference(ConferenceDetails {
                conference: required_text("conference", &fields.conference)?,
                location: required_text("location", &fields.location)?,
                number: required_text("number", &fields.number)?,
            }),
            ReferenceKind::Thesis => Details::Thesis(ThesisDetails {
                university: required_text("university", &fields.university)?,
                department: required_text("department", &fields.department)?,
            }),
            ReferenceKind::Book => Details::Book(BookDetails {
                publisher: required_text("publisher", &fields.publisher)?,
                edition: fields.edition.ok_or_else(|| Error::missing("edition"))?,
            }),
            ReferenceKind::Note => Details::Note(NoteDetails {
                name: required_text("name", &fields.name)?,
            }),
        };
        Ok(details)
    }

    pub fn kind(&self) -> ReferenceKind {
        match self {
            Details::Article(_) => ReferenceKind::Article,
            Details::Conference(_) => ReferenceKind::Conference,
            Details::Thesis(_) => ReferenceKind::Thesis,
            Details::Book(_) => ReferenceKind::Book,
            Details::Note(_) => ReferenceKind::Note,
        }
    }

    /// Journal name, for articles only
    pub fn journal(&self) -> Option<&str> {
        match self {
            Details::Article(article) => Some(&article.journal),
            _ => None,
        }
    }

    /// Derive the label from the payload and the shared fields
    fn derive_label(&self, title: &str, authors: &[String], year: i32) -> Result<String> {
        let label = match self {
            Details::Article(a) => {
                format!("{}_{}_{}_{}", strip(&a.journal), a.issue, a.number, year)
            }
            Details::Conference(c) => format!("{}_{}_{}", strip(&c.conference), c.number, year),
            Details::Thesis(t) => {
                let first = authors
                    .first()
                    .ok_or_else(|| Error::validation("authors", "a thesis needs an author"))?;
                let surname = first.split_whitespace().nth(1).ok_or_else(|| {
                    Error::validation(
                        "authors",
                        format!("first author '{}' is not in 'First Last' form", first),
                    )
                })?;
                format!("{}_{}_{}", surname, strip(&t.university), year)
            }
            Details::Book(b) => format!(
                "{}_{}Edition_{}",
                strip(title),
                b.edition,
                strip(&b.publisher)
            ),
            Details::Note(n) => format!("{}_{}", strip(&n.name), year),
        };
        Ok(label)
    }

    /// One-line description of the kind-specific fields
    fn summary(&self, year: i32) -> String {
        match self {
            Details::Article(a) => format!("{} {}, {} ({})", a.journal, a.issue, a.number, year),
            Details::Conference(c) => {
                format!("{}, {}, no. {} ({})", c.conference, c.location, c.number, year)
            }
            Details::Thesis(t) => format!("Thesis, {}, {} ({})", t.department, t.university, year),
            Details::Book(b) => format!("{}, edition {} ({})", b.publisher, b.edition, year),
            Details::Note(n) => format!("Note: {} ({})", n.name, year),
        }
    }

    /// Overwrite payload fields from an edit, rejecting fields of other kinds
    fn apply(&mut self, edit: &DetailFields) -> Result<()> {
        let kind = self.kind();
        let reject = |field: &str| {
            Error::validation(field, format!("field does not apply to a {} entry", kind))
        };

        match self {
            Details::Article(a) => {
                edit.ensure_only(&["journal", "issue", "number"], reject)?;
                set_text("journal", &mut a.journal, &edit.journal)?;
                if let Some(issue) = edit.issue {
                    a.issue = issue;
                }
                set_text("number", &mut a.number, &edit.number)?;
            }
            Details::Conference(c) => {
                edit.ensure_only(&["conference", "location", "number"], reject)?;
                set_text("conference", &mut c.conference, &edit.conference)?;
                set_text("location", &mut c.location, &edit.location)?;
                set_text("number", &mut c.number, &edit.number)?;
            }
            Details::Thesis(t) => {
                edit.ensure_only(&["university", "department"], reject)?;
                set_text("university", &mut t.university, &edit.university)?;
                set_text("department", &mut t.department, &edit.department)?;
            }
            Details::Book(b) => {
                edit.ensure_only(&["publisher", "edition"], reject)?;
                set_text("publisher", &mut b.publisher, &edit.publisher)?;
                if let Some(edition) = edit.edition {
                    b.edition = edition;
                }
            }
            Details::Note(n) => {
                edit.ensure_only(&["name"], reject)?;
                set_text("name", &mut n.name, &edit.name)?;
            }
        }
        Ok(())
    }
}

/// Kind-specific input fields, all optional until validated against a kind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailFields {
    pub journal: Option<String>,
    pub issue: Option<u32>,
    pub number: Option<String>,
    pub conference: Option<String>,
    pub location: Option<String>,
    pub university: Option<String>,
    pub department: Option<String>,
    pub publisher: Option<String>,
    pub edition: Option<u32>,
    pub name: Option<String>,
}

impl DetailFields {
    /// Names of the fields that carry a value
    pub fn supplied(&self) -> Vec<&'static str> {
        let flags = [
            ("journal", self.journal.is_some()),
            ("issue", self.issue.is_some()),
            ("number", self.number.is_some()),
            ("conference", self.conference.is_some()),
            ("location", self.location.is_some()),
            ("university", self.university.is_some()),
            ("department", self.department.is_some()),
            ("publisher", self.publisher.is_some()),
            ("edition", self.edition.is_some()),
            ("name", self.name.is_some()),
        ];
        flags
            .into_iter()
            .filter(|(_, set)| *set)
            .map(|(name, _)| name)
            .collect()
    }

    fn ensure_only(&self, allowed: &[&str], reject: impl Fn(&str) -> Error) -> Result<()> {
        match self.supplied().into_iter().find(|f| !allowed.contains(f)) {
            Some(field) => Err(reject(field)),
            None => Ok(()),
        }
    }
}

/// Input for creating a reference
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceFields {
    pub title: Option<String>,
    pub authors: Vec<String>,
    pub year: Option<i32>,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub details: DetailFields,
}

/// Changes to an existing reference, applied together or not at all
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceEdit {
    pub title: Option<String>,
    pub authors: Option<Vec<String>>,
    pub year: Option<i32>,
    pub category: Option<String>,
    pub details: DetailFields,
    pub add_tags: Vec<String>,
    pub remove_tags: Vec<String>,
    /// Index of a note to drop
    pub remove_note: Option<usize>,
}

impl ReferenceEdit {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.authors.is_none()
            && self.year.is_none()
            && self.category.is_none()
            && self.details.supplied().is_empty()
            && self.add_tags.is_empty()
            && self.remove_tags.is_empty()
            && self.remove_note.is_none()
    }
}

/// Status flags to raise on a reference
///
/// `important` and `printed` are only ever set. `to_read` clears `read`,
/// then `read` sets it, so `read` wins when both are given.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MarkFlags {
    pub important: bool,
    pub printed: bool,
    pub to_read: bool,
    pub read: bool,
}

/// A bibliographic entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    label: String,
    pub title: String,
    pub authors: Vec<String>,
    pub year: i32,
    pub category: String,
    pub details: Details,
    #[serde(default)]
    pub(crate) tags: Vec<String>,
    #[serde(default)]
    pub important: bool,
    #[serde(default)]
    pub printed: bool,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub notes: Vec<String>,
    /// Labels this entry cites
    #[serde(default)]
    pub(crate) references: Vec<String>,
    /// Labels that cite this entry
    #[serde(default)]
    pub(crate) citations: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_file: Option<PathBuf>,
}

impl Reference {
    /// Validate `fields` for `kind` and build a new reference with its label
    pub fn create(kind: ReferenceKind, fields: ReferenceFields) -> Result<Self> {
        let title = required_text("title", &fields.title)?;
        let year = fields.year.ok_or_else(|| Error::missing("year"))?;
        let category = required_text("category", &fields.category)?;
        let authors = clean_authors(fields.authors);
        if authors.is_empty() && kind != ReferenceKind::Note {
            return Err(Error::validation(
                "authors",
                format!("a {} needs at least one author", kind),
            ));
        }

        check_category(&category)?;

        let details = Details::from_fields(kind, &fields.details)?;
        let label = details.derive_label(&title, &authors, year)?;
        ensure_file_name("label", &label)?;

        let mut tags = Vec::new();
        insert_tag(&mut tags, &category);
        for tag in &fields.tags {
            insert_tag(&mut tags, tag);
        }

        Ok(Self {
            label,
            title,
            authors,
            year,
            category,
            details,
            tags,
            important: false,
            printed: false,
            read: false,
            notes: Vec::new(),
            references: Vec::new(),
            citations: Vec::new(),
            file: None,
            original_file: None,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn kind(&self) -> ReferenceKind {
        self.details.kind()
    }

    /// Lower-cased tags, sorted, always including the category
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Labels this entry cites
    pub fn references(&self) -> &[String] {
        &self.references
    }

    /// Labels that cite this entry
    pub fn citations(&self) -> &[String] {
        &self.citations
    }

    /// One-line description of the kind-specific fields
    pub fn summary(&self) -> String {
        self.details.summary(self.year)
    }

    /// Authors joined for display and search
    pub fn author_line(&self) -> String {
        self.authors.join(", ")
    }

    /// Record where the managed copy of the document lives
    pub fn attach_file(&mut self, file: PathBuf, original_file: Option<PathBuf>) {
        self.file = Some(file);
        self.original_file = original_file;
    }

    /// Add a tag (lower-cased). Returns false if it was already present.
    pub fn add_tag(&mut self, tag: &str) -> Result<bool> {
        if tag.trim().is_empty() {
            return Err(Error::validation("tag", "tag is empty"));
        }
        Ok(insert_tag(&mut self.tags, tag))
    }

    /// Remove a tag by value
    pub fn remove_tag(&mut self, tag: &str) -> Result<()> {
        let wanted = tag.trim().to_lowercase();
        if wanted == self.category.to_lowercase() {
            return Err(Error::validation(
                "tag",
                format!("'{}' is the category of {} and cannot be removed", wanted, self.label),
            ));
        }
        let pos = self
            .tags
            .iter()
            .position(|t| *t == wanted)
            .ok_or_else(|| Error::TagNotFound {
                label: self.label.clone(),
                tag: tag.to_string(),
            })?;
        self.tags.remove(pos);
        Ok(())
    }

    pub fn add_notes<I, S>(&mut self, notes: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.notes.extend(notes.into_iter().map(Into::into));
    }

    /// Remove the note at `index`, returning it
    pub fn remove_note(&mut self, index: usize) -> Result<String> {
        if index >= self.notes.len() {
            return Err(Error::Index {
                label: self.label.clone(),
                list: "notes",
                index,
                len: self.notes.len(),
            });
        }
        Ok(self.notes.remove(index))
    }

    pub fn mark(&mut self, flags: MarkFlags) {
        if flags.important {
            self.important = true;
        }
        if flags.printed {
            self.printed = true;
        }
        if flags.to_read {
            self.read = false;
        }
        if flags.read {
            self.read = true;
        }
    }

    /// Apply field replacements, then tag and note changes
    ///
    /// Everything is staged on a copy, so an error leaves the reference
    /// unchanged. The label is left untouched.
    pub fn apply_edit(&mut self, edit: &ReferenceEdit) -> Result<()> {
        let mut staged = self.clone();

        staged.details.apply(&edit.details)?;
        set_text("title", &mut staged.title, &edit.title)?;
        if let Some(year) = edit.year {
            staged.year = year;
        }
        if let Some(ref authors) = edit.authors {
            let authors = clean_authors(authors.clone());
            if authors.is_empty() && staged.kind() != ReferenceKind::Note {
                return Err(Error::validation(
                    "authors",
                    format!("a {} needs at least one author", staged.kind()),
                ));
            }
            staged.authors = authors;
        }
        if let Some(ref category) = edit.category {
            let old = staged.category.to_lowercase();
            set_text("category", &mut staged.category, &edit.category)?;
            check_category(&staged.category)?;
            if old != category.trim().to_lowercase() {
                staged.tags.retain(|t| *t != old);
            }
            insert_tag(&mut staged.tags, &staged.category);
        }

        for tag in &edit.add_tags {
            staged.add_tag(tag)?;
        }
        for tag in &edit.remove_tags {
            staged.remove_tag(tag)?;
        }
        if let Some(index) = edit.remove_note {
            staged.remove_note(index)?;
        }

        *self = staged;
        Ok(())
    }
}

/// Remove spaces, periods, colons and parentheses
pub fn strip(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, ' ' | '.' | ':' | '(' | ')'))
        .collect()
}

/// Categories name directories under the file store
fn check_category(category: &str) -> Result<()> {
    ensure_file_name("category", category)?;
    if category.to_lowercase() == ARCHIVE_DIR {
        return Err(Error::validation(
            "category",
            format!("'{}' is reserved for removed documents", category),
        ));
    }
    Ok(())
}

/// Require `name` to be exactly one normal path component
fn ensure_file_name(field: &str, name: &str) -> Result<()> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) if !name.contains(['/', '\\']) => Ok(()),
        _ => Err(Error::validation(
            field,
            format!("'{}' cannot be used as a file name", name),
        )),
    }
}

/// Insert a lower-cased tag keeping the list sorted and unique
fn insert_tag(tags: &mut Vec<String>, tag: &str) -> bool {
    let tag = tag.trim().to_lowercase();
    if tags.contains(&tag) {
        return false;
    }
    tags.push(tag);
    tags.sort();
    true
}

fn required_text(field: &str, value: &Option<String>) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(Error::missing(field)),
    }
}

fn set_text(field: &str, target: &mut String, value: &Option<String>) -> Result<()> {
    if value.is_some() {
        *target = required_text(field, value)?;
    }
    Ok(())
}

fn clean_authors(authors: Vec<String>) -> Vec<String> {
    authors
        .into_iter()
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
        .collect()
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn article(journal: &str, issue: u32, number: &str, year: i32) -> Reference {
        Reference::create(
            ReferenceKind::Article,
            ReferenceFields {
                title: Some(format!("Results from {}", journal)),
                authors: vec!["Jane Doe".to_string(), "John Smith".to_string()],
                year: Some(year),
                category: Some("Physics".to_string()),
                tags: vec!["Neutrino".to_string()],
                details: DetailFields {
                    journal: Some(journal.to_string()),
                    issue: Some(issue),
                    number: Some(number.to_string()),
                    ..Default::default()
                },
            },
        )
        .unwrap()
    }

    pub fn book(title: &str, edition: u32, publisher: &str) -> Reference {
        Reference::create(
            ReferenceKind::Book,
            ReferenceFields {
                title: Some(title.to_string()),
                authors: vec!["Ada Writer".to_string()],
                year: Some(2016),
                category: Some("ML".to_string()),
                tags: vec![],
                details: DetailFields {
                    publisher: Some(publisher.to_string()),
                    edition: Some(edition),
                    ..Default::default()
                },
            },
        )
        .unwrap()
    }
}
