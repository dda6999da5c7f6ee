//! Domain errors
//!
//! Every operation on the reference model, the link graph and the winnowing
//! engine fails with one of these. None of them leave the collection
//! partially modified.

use thiserror::Error;

/// Errors raised by the reference model and collection operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Malformed or incomplete input to creation, label derivation or edits
    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    /// A label was requested that is not in the collection
    #[error("Reference not found: {0}")]
    ReferenceNotFound(String),

    /// Tag removal on an entry that does not carry the tag
    #[error("Tag '{tag}' not found on {label}")]
    TagNotFound { label: String, tag: String },

    /// Note or link index outside the current list
    #[error("Index {index} out of range for {list} of {label} (length {len})")]
    Index {
        label: String,
        list: &'static str,
        index: usize,
        len: usize,
    },

    /// Label collision on add
    #[error("Reference already exists: {0}")]
    Duplicate(String),

    /// Citation graph asymmetry
    #[error("Citation graph is inconsistent: {0}")]
    Corruption(String),
}

impl Error {
    pub(crate) fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub(crate) fn missing(field: &str) -> Self {
        Error::validation(field, "required field is missing")
    }

    /// True for either kind of not-found error
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::ReferenceNotFound(_) | Error::TagNotFound { .. }
        )
    }
}

/// Result type for domain operations
pub type Result<T> = std::result::Result<T, Error>;
