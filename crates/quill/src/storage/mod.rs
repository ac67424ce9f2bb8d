//! Storage layer for quill.
//!
//! This module provides `SQLite`-based persistent storage for journal
//! entries: insertion, lookup, newest-first listing, and in-place edits.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::entry::{Entry, EntryDraft};
use crate::error::{Error, Result};

/// Storage engine for journal entries.
///
/// Wraps a single `SQLite` connection. Entries are listed in descending
/// creation order, with the row id as a tie-breaker so the order stays
/// deterministic for entries created within the same second.
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    /// Initializes the schema if this is a new database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema
    /// initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        // WAL keeps reads cheap while the web handlers share one writer
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        migrations::initialize_schema(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory storage instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Insert a new entry from a validated draft.
    ///
    /// Both timestamps are set to the current time; the returned entry
    /// carries the assigned id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn insert(&self, draft: &EntryDraft) -> Result<Entry> {
        let now = Utc::now();
        let stamp = now.to_rfc3339();

        self.conn.execute(
            r"
            INSERT INTO entries (title, body, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ",
            params![draft.title(), draft.body(), stamp, stamp],
        )?;

        let id = self.conn.last_insert_rowid();
        debug!("Inserted entry with id {}", id);

        Ok(Entry {
            id,
            title: draft.title().to_string(),
            body: draft.body().to_string(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Get an entry by its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get(&self, id: i64) -> Result<Option<Entry>> {
        let result = self
            .conn
            .query_row(
                r"
                SELECT id, title, body, created_at, updated_at
                FROM entries WHERE id = ?1
                ",
                [id],
                Self::row_to_entry,
            )
            .optional()?;
        Ok(result)
    }

    /// List all entries, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn all(&self) -> Result<Vec<Entry>> {
        let mut stmt = self.conn.prepare(
            r"
            SELECT id, title, body, created_at, updated_at
            FROM entries ORDER BY created_at DESC, id DESC
            ",
        )?;

        let entries = stmt
            .query_map([], Self::row_to_entry)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    /// Update an entry's title and body, refreshing `updated_at`.
    ///
    /// The id and creation timestamp are untouched. Returns `true` if an
    /// entry was updated, `false` if no entry has the given id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn update(&self, id: i64, draft: &EntryDraft) -> Result<bool> {
        let stamp = Utc::now().to_rfc3339();

        let affected = self.conn.execute(
            r"
            UPDATE entries SET title = ?1, body = ?2, updated_at = ?3
            WHERE id = ?4
            ",
            params![draft.title(), draft.body(), stamp, id],
        )?;

        if affected > 0 {
            debug!("Updated entry {}", id);
        }
        Ok(affected > 0)
    }

    /// Count total entries in storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Drop all journal data and recreate the schema.
    ///
    /// This is the `init-db --force` path and destroys every entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn reset(&self) -> Result<()> {
        self.conn
            .execute_batch("DROP TABLE IF EXISTS entries; DROP TABLE IF EXISTS metadata;")?;
        migrations::initialize_schema(&self.conn)?;
        info!("Database reset at {}", self.path.display());
        Ok(())
    }

    /// Get database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StorageStats> {
        let total_entries = self.count()?;

        let oldest: Option<String> = self
            .conn
            .query_row(
                "SELECT created_at FROM entries ORDER BY created_at ASC, id ASC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;

        let newest: Option<String> = self
            .conn
            .query_row(
                "SELECT created_at FROM entries ORDER BY created_at DESC, id DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;

        let oldest_entry = oldest
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&Utc));
        let newest_entry = newest
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StorageStats {
            total_entries,
            oldest_entry,
            newest_entry,
            db_size_bytes,
        })
    }

    /// Convert a database row to an Entry struct.
    fn row_to_entry(row: &rusqlite::Row) -> rusqlite::Result<Entry> {
        let id: i64 = row.get(0)?;
        let title: String = row.get(1)?;
        let body: String = row.get(2)?;
        let created_str: String = row.get(3)?;
        // NULL only in not-yet-migrated v1 rows; fall back to creation time.
        let updated_str: Option<String> = row.get(4)?;

        let created_at = parse_stamp(&created_str);
        let updated_at = updated_str.as_deref().map_or(created_at, parse_stamp);

        Ok(Entry {
            id,
            title,
            body,
            created_at,
            updated_at,
        })
    }
}

/// Parse an RFC 3339 timestamp, falling back to now on malformed data.
fn parse_stamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc))
}

/// Statistics about the storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageStats {
    /// Total number of entries stored.
    pub total_entries: i64,
    /// Creation timestamp of the oldest entry.
    pub oldest_entry: Option<DateTime<Utc>>,
    /// Creation timestamp of the newest entry.
    pub newest_entry: Option<DateTime<Utc>>,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}
