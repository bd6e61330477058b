//! Storage layer for the TrackStar time tracker.
//!
//! Provides a small key/value store on top of `rusqlite`, playing the role
//! browser local storage plays for a web client: each key holds one JSON
//! document that is rewritten in full on every change.
//!
//! # Thread Safety
//!
//! [`LocalStorage`] wraps a `rusqlite::Connection`, which is `Send` but not
//! `Sync`. Move it between threads freely, but share it only behind a
//! `Mutex` or open one instance per thread.
//!
//! # Schema
//!
//! A single `local_storage` table keyed by `key`. `updated_at` holds an
//! ISO 8601 UTC timestamp (e.g. `2025-01-15T10:30:00Z`) of the last write.

use std::path::Path;

use chrono::{SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use thiserror::Error;
use ts_core::Persistence;

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// SQLite-backed key/value storage.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct LocalStorage {
    conn: Connection,
}

impl std::fmt::Debug for LocalStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalStorage")
            .field("path", &self.conn.path())
            .finish_non_exhaustive()
    }
}

impl LocalStorage {
    /// Opens storage at the given path, creating it if necessary.
    ///
    /// The schema is initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let storage = Self { conn };
        storage.init()?;
        Ok(storage)
    }

    /// Opens in-memory storage.
    ///
    /// Useful for testing. The data is gone when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let storage = Self { conn };
        storage.init()?;
        Ok(storage)
    }

    /// Initializes the schema. Idempotent.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS local_storage (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    /// Returns the value stored under `key`.
    pub fn get_item(&self, key: &str) -> Result<Option<String>, DbError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM local_storage WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub fn set_item(&mut self, key: &str, value: &str) -> Result<(), DbError> {
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        self.conn.execute(
            "
            INSERT INTO local_storage (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            ",
            params![key, value, now],
        )?;
        tracing::debug!(key, bytes = value.len(), "stored item");
        Ok(())
    }

    /// Removes `key`. Returns whether it existed.
    pub fn remove_item(&mut self, key: &str) -> Result<bool, DbError> {
        let removed = self
            .conn
            .execute("DELETE FROM local_storage WHERE key = ?1", params![key])?;
        Ok(removed > 0)
    }

    /// Lists stored keys in lexicographic order.
    pub fn keys(&self) -> Result<Vec<String>, DbError> {
        let mut stmt = self
            .conn
            .prepare("SELECT key FROM local_storage ORDER BY key")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        let mut keys = Vec::new();
        for key in rows {
            keys.push(key?);
        }
        Ok(keys)
    }
}

impl Persistence for LocalStorage {
    type Error = DbError;

    fn load(&self, key: &str) -> Result<Option<String>, Self::Error> {
        self.get_item(key)
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), Self::Error> {
        self.set_item(key, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use ts_core::{CATEGORIES_KEY, DEFAULT_CATEGORIES, ENTRIES_KEY, NewEntry, Store};

    #[test]
    fn open_in_memory_storage() {
        let storage = LocalStorage::open_in_memory();
        assert!(storage.is_ok());
    }

    #[test]
    fn schema_matches_data_model() {
        let storage = LocalStorage::open_in_memory().expect("open in-memory storage");
        let mut stmt = storage
            .conn
            .prepare("PRAGMA table_info(local_storage)")
            .expect("prepare table_info");
        let columns: Vec<String> = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .expect("query table_info")
            .map(|row| row.expect("table_info row"))
            .collect();
        assert_eq!(columns, vec!["key", "value", "updated_at"]);
    }

    #[test]
    fn set_item_overwrites_previous_value() {
        let mut storage = LocalStorage::open_in_memory().unwrap();
        assert_eq!(storage.get_item("a").unwrap(), None);

        storage.set_item("a", "[1]").unwrap();
        storage.set_item("a", "[1,2]").unwrap();

        assert_eq!(storage.get_item("a").unwrap().as_deref(), Some("[1,2]"));
        assert_eq!(storage.keys().unwrap(), vec!["a"]);
    }

    #[test]
    fn remove_item_reports_existence() {
        let mut storage = LocalStorage::open_in_memory().unwrap();
        storage.set_item("a", "x").unwrap();
        assert!(storage.remove_item("a").unwrap());
        assert!(!storage.remove_item("a").unwrap());
        assert!(storage.keys().unwrap().is_empty());
    }

    #[test]
    fn store_state_survives_reopen() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("trackstar.db");

        let mut store = Store::open(LocalStorage::open(&path).unwrap()).unwrap();
        let category = store.add_category("Reading").unwrap();
        store
            .append_entry(NewEntry {
                category_id: category.id.clone(),
                category_name: category.name.clone(),
                duration_seconds: 125,
                description: Some("chapter 3".to_string()),
            })
            .unwrap();
        drop(store);

        let reopened = Store::open(LocalStorage::open(&path).unwrap()).unwrap();
        assert_eq!(reopened.categories().len(), DEFAULT_CATEGORIES.len() + 1);
        assert_eq!(reopened.entries().len(), 1);
        assert_eq!(reopened.entries()[0].category_name, "Reading");
        assert_eq!(
            reopened.storage().keys().unwrap(),
            vec![CATEGORIES_KEY, ENTRIES_KEY]
        );
    }
}
