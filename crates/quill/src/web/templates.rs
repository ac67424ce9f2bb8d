//! Askama view models for the journal pages.

use askama::Template;

use crate::entry::Entry;
use crate::render::MarkdownRenderer;

/// Display format for entry timestamps.
const STAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// An entry prepared for display: formatted timestamps and rendered body.
pub(crate) struct EntryView {
    pub id: i64,
    pub title: String,
    pub created: String,
    pub updated: Option<String>,
    pub body_html: String,
}

impl EntryView {
    /// Prepare an entry for display, rendering its Markdown body.
    pub(crate) fn new(entry: &Entry, renderer: &MarkdownRenderer) -> Self {
        Self {
            id: entry.id,
            title: entry.title.clone(),
            created: entry.created_at.format(STAMP_FORMAT).to_string(),
            updated: entry
                .is_edited()
                .then(|| entry.updated_at.format(STAMP_FORMAT).to_string()),
            body_html: renderer.render(&entry.body),
        }
    }
}

/// The front page: entry listing plus the new-entry form when logged in.
#[derive(Template)]
#[template(path = "index.html")]
pub(crate) struct IndexPage {
    pub entries: Vec<EntryView>,
    pub logged_in: bool,
    pub flash: Option<String>,
    pub form_error: Option<String>,
    pub draft_title: String,
    pub draft_body: String,
}

/// A single entry with its rendered body.
#[derive(Template)]
#[template(path = "entry.html")]
pub(crate) struct EntryPage {
    pub entry: EntryView,
    pub logged_in: bool,
    pub flash: Option<String>,
}

/// The edit form, pre-filled with the entry's raw Markdown.
#[derive(Template)]
#[template(path = "edit.html")]
pub(crate) struct EditPage {
    pub id: i64,
    pub draft_title: String,
    pub draft_body: String,
    pub logged_in: bool,
    pub flash: Option<String>,
    pub form_error: Option<String>,
}

/// The login form.
#[derive(Template)]
#[template(path = "login.html")]
pub(crate) struct LoginPage {
    pub logged_in: bool,
    pub flash: Option<String>,
    pub form_error: Option<String>,
}
