//! History storage
//!
//! SQLite-backed store for captured pasteboard items and watcher settings

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::pasteboard::models::{ContentKind, PasteboardItem};

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

const ITEM_COLUMNS: &str = "id, kind, text, html, image_path, preview, hash, created_at";

/// Pasteboard history database
///
/// Owns its connection; the watcher (or an embedder) constructs and holds
/// one instance instead of sharing process-global state.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) the database at the given path
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        log::info!("opening history database at {:?}", path);
        Self::prepare(Connection::open(path)?)
    }

    /// Open an in-memory database (test and embedding seam)
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        Self::prepare(Connection::open_in_memory()?)
    }

    fn prepare(conn: Connection) -> Result<Self, DatabaseError> {
        conn.execute_batch(
            r#"
            -- Pasteboard history table
            CREATE TABLE IF NOT EXISTS pasteboard_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                kind TEXT NOT NULL,
                text TEXT,
                html TEXT,
                image_path TEXT,
                preview TEXT NOT NULL,
                hash TEXT NOT NULL UNIQUE,
                created_at TEXT NOT NULL
            );

            -- Watcher settings table
            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            -- Indexes
            CREATE INDEX IF NOT EXISTS idx_history_created_at ON pasteboard_history(created_at DESC);
            CREATE INDEX IF NOT EXISTS idx_history_kind ON pasteboard_history(kind);
            "#,
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Insert a new history item, returning its row id
    pub fn insert_item(&self, item: &PasteboardItem) -> Result<i64, DatabaseError> {
        let conn = self.conn.lock();
        conn.execute(
            r#"
            INSERT OR REPLACE INTO pasteboard_history
            (kind, text, html, image_path, preview, hash, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                item.kind.as_str(),
                item.text,
                item.html,
                item.image_path,
                item.preview,
                item.hash,
                item.created_at.to_rfc3339(),
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// Fetch history items, newest first
    pub fn all_items(&self, limit: Option<u32>) -> Result<Vec<PasteboardItem>, DatabaseError> {
        let conn = self.conn.lock();
        let sql = match limit {
            Some(n) if n > 0 => format!(
                "SELECT {} FROM pasteboard_history ORDER BY created_at DESC, id DESC LIMIT {}",
                ITEM_COLUMNS, n
            ),
            _ => format!(
                "SELECT {} FROM pasteboard_history ORDER BY created_at DESC, id DESC",
                ITEM_COLUMNS
            ),
        };

        let mut stmt = conn.prepare(&sql)?;
        let items = stmt
            .query_map([], row_to_item)?
            .filter_map(|r| r.ok())
            .collect();

        Ok(items)
    }

    /// Get a single item by id
    pub fn item_by_id(&self, id: i64) -> Result<Option<PasteboardItem>, DatabaseError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM pasteboard_history WHERE id = ?1",
            ITEM_COLUMNS
        ))?;

        let item = stmt.query_row([id], row_to_item).optional()?;
        Ok(item)
    }

    /// Search items whose text or preview contains the query, newest first
    pub fn search_items(
        &self,
        query: &str,
        limit: Option<u32>,
    ) -> Result<Vec<PasteboardItem>, DatabaseError> {
        let conn = self.conn.lock();
        let pattern = format!("%{}%", query);
        let limit_clause = match limit {
            Some(n) if n > 0 => format!("LIMIT {}", n),
            _ => String::new(),
        };

        let sql = format!(
            "SELECT {} FROM pasteboard_history
             WHERE text LIKE ?1 OR preview LIKE ?1
             ORDER BY created_at DESC, id DESC {}",
            ITEM_COLUMNS, limit_clause
        );

        let mut stmt = conn.prepare(&sql)?;
        let items = stmt
            .query_map([&pattern], row_to_item)?
            .filter_map(|r| r.ok())
            .collect();

        Ok(items)
    }

    /// Delete the item with the given id
    pub fn delete_item(&self, id: i64) -> Result<bool, DatabaseError> {
        let conn = self.conn.lock();
        let affected = conn.execute("DELETE FROM pasteboard_history WHERE id = ?1", [id])?;
        Ok(affected > 0)
    }

    /// Clear the whole history
    pub fn clear_all(&self) -> Result<(), DatabaseError> {
        let conn = self.conn.lock();
        conn.execute("DELETE FROM pasteboard_history", [])?;
        Ok(())
    }

    /// Check whether a content hash is already stored
    pub fn hash_exists(&self, hash: &str) -> Result<bool, DatabaseError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT 1 FROM pasteboard_history WHERE hash = ?1 LIMIT 1")?;
        let exists = stmt.exists([hash])?;
        Ok(exists)
    }

    /// Total number of stored items
    pub fn item_count(&self) -> Result<i64, DatabaseError> {
        let conn = self.conn.lock();
        let count = conn.query_row("SELECT COUNT(*) FROM pasteboard_history", [], |row| {
            row.get(0)
        })?;
        Ok(count)
    }

    /// Delete the oldest items beyond `limit`, returning how many went
    pub fn purge_to_limit(&self, limit: i64) -> Result<i64, DatabaseError> {
        if limit <= 0 {
            return Ok(0); // Unlimited mode
        }

        let conn = self.conn.lock();
        let purged = conn.execute(
            r#"
            DELETE FROM pasteboard_history
            WHERE id NOT IN (
                SELECT id FROM pasteboard_history
                ORDER BY created_at DESC, id DESC
                LIMIT ?1
            )
            "#,
            [limit],
        )?;

        Ok(purged as i64)
    }

    // ============== Settings Operations ==============

    /// Save a setting value
    pub fn set_setting(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Get a setting value
    pub fn setting(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT value FROM settings WHERE key = ?1")?;
        let value = stmt.query_row([key], |row| row.get(0)).optional()?;
        Ok(value)
    }
}

fn row_to_item(row: &Row<'_>) -> rusqlite::Result<PasteboardItem> {
    Ok(PasteboardItem {
        id: row.get(0)?,
        kind: ContentKind::from_str(row.get::<_, String>(1)?.as_str()).unwrap_or(ContentKind::Text),
        text: row.get(2)?,
        html: row.get(3)?,
        image_path: row.get(4)?,
        preview: row.get(5)?,
        hash: row.get(6)?,
        created_at: DateTime::parse_from_rfc3339(&row.get::<_, String>(7)?)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_item(text: &str) -> PasteboardItem {
        PasteboardItem::new_text(0, text.to_string(), format!("hash-{}", text))
    }

    #[test]
    fn insert_and_fetch_round_trip() {
        let db = Database::open_in_memory().unwrap();
        let id = db.insert_item(&sample_item("hello")).unwrap();

        let fetched = db.item_by_id(id).unwrap().unwrap();
        assert_eq!(fetched.text.as_deref(), Some("hello"));
        assert_eq!(fetched.kind, ContentKind::Text);
        assert_eq!(fetched.hash, "hash-hello");
    }

    #[test]
    fn missing_item_is_none() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.item_by_id(42).unwrap().is_none());
    }

    #[test]
    fn hash_exists_after_insert() {
        let db = Database::open_in_memory().unwrap();
        assert!(!db.hash_exists("hash-a").unwrap());
        db.insert_item(&sample_item("a")).unwrap();
        assert!(db.hash_exists("hash-a").unwrap());
    }

    #[test]
    fn all_items_returns_newest_first() {
        let db = Database::open_in_memory().unwrap();
        for text in ["first", "second", "third"] {
            db.insert_item(&sample_item(text)).unwrap();
        }

        let items = db.all_items(None).unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].text.as_deref(), Some("third"));
        assert_eq!(items[2].text.as_deref(), Some("first"));

        let limited = db.all_items(Some(2)).unwrap();
        assert_eq!(limited.len(), 2);
    }

    #[test]
    fn search_matches_text() {
        let db = Database::open_in_memory().unwrap();
        db.insert_item(&sample_item("the quick brown fox")).unwrap();
        db.insert_item(&sample_item("lazy dog")).unwrap();

        let hits = db.search_items("quick", None).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].text.as_deref(), Some("the quick brown fox"));

        assert!(db.search_items("zebra", None).unwrap().is_empty());
    }

    #[test]
    fn delete_and_clear() {
        let db = Database::open_in_memory().unwrap();
        let id = db.insert_item(&sample_item("a")).unwrap();
        db.insert_item(&sample_item("b")).unwrap();

        assert!(db.delete_item(id).unwrap());
        assert!(!db.delete_item(id).unwrap());
        assert_eq!(db.item_count().unwrap(), 1);

        db.clear_all().unwrap();
        assert_eq!(db.item_count().unwrap(), 0);
    }

    #[test]
    fn purge_keeps_the_newest_items() {
        let db = Database::open_in_memory().unwrap();
        for i in 0..10 {
            db.insert_item(&sample_item(&format!("item-{}", i))).unwrap();
        }

        let purged = db.purge_to_limit(4).unwrap();
        assert_eq!(purged, 6);

        let remaining = db.all_items(None).unwrap();
        assert_eq!(remaining.len(), 4);
        assert_eq!(remaining[0].text.as_deref(), Some("item-9"));
        assert_eq!(remaining[3].text.as_deref(), Some("item-6"));
    }

    #[test]
    fn purge_is_a_noop_when_unlimited() {
        let db = Database::open_in_memory().unwrap();
        db.insert_item(&sample_item("a")).unwrap();
        assert_eq!(db.purge_to_limit(-1).unwrap(), 0);
        assert_eq!(db.item_count().unwrap(), 1);
    }

    #[test]
    fn settings_round_trip() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.setting("poll_interval_ms").unwrap().is_none());

        db.set_setting("poll_interval_ms", "150").unwrap();
        assert_eq!(
            db.setting("poll_interval_ms").unwrap().as_deref(),
            Some("150")
        );

        db.set_setting("poll_interval_ms", "500").unwrap();
        assert_eq!(
            db.setting("poll_interval_ms").unwrap().as_deref(),
            Some("500")
        );
    }

    #[test]
    fn reopening_a_file_database_keeps_items() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.db");

        {
            let db = Database::open(&path).unwrap();
            db.insert_item(&sample_item("persisted")).unwrap();
        }

        let db = Database::open(&path).unwrap();
        let items = db.all_items(None).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].text.as_deref(), Some("persisted"));
    }
}
