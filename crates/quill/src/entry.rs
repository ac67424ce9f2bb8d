//! Journal entry types.
//!
//! This module defines the journal entry record stored in the database and
//! the validated draft type accepted from the web forms.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Maximum accepted title length in characters.
pub const MAX_TITLE_LEN: usize = 127;

/// A single journal entry.
///
/// Entries are created once, edited in place, and never deleted. The
/// creation timestamp is immutable and is the sole sort key for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Unique identifier, assigned by the storage layer.
    pub id: i64,

    /// Short title, at most [`MAX_TITLE_LEN`] characters.
    pub title: String,

    /// Markdown body text.
    pub body: String,

    /// When the entry was created. Immutable.
    pub created_at: DateTime<Utc>,

    /// When the entry was last edited. Equals `created_at` until the
    /// first edit.
    pub updated_at: DateTime<Utc>,
}

impl Entry {
    /// Check whether this entry has been edited since creation.
    #[must_use]
    pub fn is_edited(&self) -> bool {
        self.updated_at > self.created_at
    }
}

/// A validated title/body pair accepted from a form submission.
///
/// Used for both creating and editing entries, so the validation rules
/// are identical on both paths: non-empty title of at most
/// [`MAX_TITLE_LEN`] characters, non-empty body. The title is trimmed;
/// the body is kept verbatim because leading whitespace is significant
/// in Markdown (four-space indentation starts a code block).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryDraft {
    title: String,
    body: String,
}

impl EntryDraft {
    /// Validate a submitted title and body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEntry`] if the title is empty or too long,
    /// or if the body is blank.
    pub fn new(title: &str, body: &str) -> Result<Self> {
        let title = title.trim();
        if title.is_empty() {
            return Err(Error::invalid_entry("title must not be empty"));
        }
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(Error::invalid_entry(format!(
                "title must be at most {MAX_TITLE_LEN} characters"
            )));
        }
        if body.trim().is_empty() {
            return Err(Error::invalid_entry("body must not be empty"));
        }
        Ok(Self {
            title: title.to_string(),
            body: body.to_string(),
        })
    }

    /// The validated title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// The validated Markdown body.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }
}
