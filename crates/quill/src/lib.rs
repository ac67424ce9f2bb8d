//! `quill` - a personal Markdown web journal
//!
//! This library provides the core functionality for a small self-hosted
//! journal: `SQLite`-backed entry storage, Markdown rendering with syntax
//! highlighting, and the server-rendered web interface for writing,
//! editing, and browsing entries newest first.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod entry;
pub mod error;
pub mod logging;
pub mod render;
pub mod storage;
pub mod web;

pub use config::Config;
pub use entry::{Entry, EntryDraft};
pub use error::{Error, Result};
pub use logging::init_logging;
pub use render::MarkdownRenderer;
pub use storage::{Storage, StorageStats};
