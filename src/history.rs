use rusqlite::{Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};

use crate::error::{SyncError, SyncResult};

const CURRENT_SCHEMA_VERSION: i32 = 1;

/// One applied wallpaper change. `id == 0` means nothing has been applied yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageChangeRecord {
    pub id: i64,
    pub image_url: String,
    pub timestamp: String,
    pub applied_at: Option<String>,
}

impl ImageChangeRecord {
    pub fn is_empty(&self) -> bool {
        self.id == 0
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(ImageChangeRecord {
            id: row.get(0)?,
            image_url: row.get(1)?,
            timestamp: row.get(2)?,
            applied_at: row.get(3)?,
        })
    }
}

/// Append-only log of applied changes. Every operation opens its own connection.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> SyncResult<Connection> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .map_err(|e| SyncError::file_system("creating database directory", parent, e))?;
        }
        Ok(Connection::open(&self.path)?)
    }

    /// Create or migrate the schema. Safe to call repeatedly.
    pub fn ensure_schema(&self) -> SyncResult<()> {
        let conn = self.connect()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER NOT NULL,
                updated TEXT NOT NULL,
                PRIMARY KEY (version)
            )",
            (),
        )?;

        let version: i32 = conn
            .query_row(
                "SELECT version FROM schema_version ORDER BY version DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?
            .unwrap_or(0);

        if version < CURRENT_SCHEMA_VERSION {
            Self::migrate_schema(&conn, version)?;
        }
        Ok(())
    }

    fn migrate_schema(conn: &Connection, from_version: i32) -> SyncResult<()> {
        if from_version < 1 {
            conn.execute(
                "CREATE TABLE IF NOT EXISTS image_changes (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    image_url TEXT NOT NULL,
                    timestamp TEXT NOT NULL,
                    applied_at TEXT NOT NULL
                )",
                (),
            )?;
            conn.execute(
                "INSERT INTO schema_version (version, updated) VALUES (1, datetime('now'))",
                [],
            )?;
        }
        Ok(())
    }

    /// The most recent change, or an empty record when none exists.
    pub fn record_latest(&self) -> SyncResult<ImageChangeRecord> {
        let conn = self.connect()?;
        let latest = conn
            .query_row(
                "SELECT id, image_url, timestamp, applied_at FROM image_changes
                 ORDER BY id DESC LIMIT 1",
                [],
                ImageChangeRecord::from_row,
            )
            .optional()?;
        Ok(latest.unwrap_or_default())
    }

    pub fn append(&self, image_url: &str, timestamp: &str) -> SyncResult<ImageChangeRecord> {
        let conn = self.connect()?;
        let applied_at = current_local_time();
        conn.execute(
            "INSERT INTO image_changes (image_url, timestamp, applied_at) VALUES (?1, ?2, ?3)",
            (image_url, timestamp, &applied_at),
        )?;
        Ok(ImageChangeRecord {
            id: conn.last_insert_rowid(),
            image_url: image_url.to_string(),
            timestamp: timestamp.to_string(),
            applied_at: Some(applied_at),
        })
    }

    /// Newest first.
    pub fn recent(&self, limit: usize) -> SyncResult<Vec<ImageChangeRecord>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT id, image_url, timestamp, applied_at FROM image_changes
             ORDER BY id DESC LIMIT ?1",
        )?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt.query_map([limit], ImageChangeRecord::from_row)?;
        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }
}

fn current_local_time() -> String {
    chrono::Local::now().format("%Y-%m-%dT%H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn store_in(dir: &tempfile::TempDir) -> HistoryStore {
        let store = HistoryStore::new(dir.path().join("history.db"));
        store.ensure_schema().unwrap();
        store
    }

    #[test]
    fn test_empty_store_returns_empty_record() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);

        let latest = store.record_latest().unwrap();
        assert!(latest.is_empty());
        assert_eq!(latest.image_url, "");
        assert_eq!(latest.timestamp, "");
        assert_eq!(latest.applied_at, None);
    }

    #[test]
    fn test_append_then_latest() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);

        let appended = store
            .append("http://x/a.png", "2024-01-01T00:00:00")
            .unwrap();
        let latest = store.record_latest().unwrap();
        assert_eq!(latest, appended);
        assert_eq!(latest.image_url, "http://x/a.png");
        assert_eq!(latest.timestamp, "2024-01-01T00:00:00");
        assert!(latest.applied_at.is_some());
    }

    #[test]
    fn test_latest_is_highest_id() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);

        let first = store.append("http://x/a.png", "2024-01-02").unwrap();
        // Older timestamp, newer row: the row order decides.
        let second = store.append("http://x/b.png", "2024-01-01").unwrap();
        assert!(second.id > first.id);
        assert_eq!(store.record_latest().unwrap().image_url, "http://x/b.png");
    }

    #[test]
    fn test_ensure_schema_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);
        store.append("http://x/a.png", "t1").unwrap();

        store.ensure_schema().unwrap();
        store.ensure_schema().unwrap();

        assert_eq!(store.recent(10).unwrap().len(), 1);
    }

    #[test]
    fn test_recent_newest_first_with_limit() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);
        for i in 0..5 {
            store.append(&format!("http://x/{i}.png"), &format!("t{i}")).unwrap();
        }

        let recent = store.recent(3).unwrap();
        let urls: Vec<&str> = recent.iter().map(|r| r.image_url.as_str()).collect();
        assert_eq!(urls, vec!["http://x/4.png", "http://x/3.png", "http://x/2.png"]);
    }

    #[test]
    fn test_creates_missing_parent_directory() {
        let dir = tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("nested").join("deeper").join("h.db"));
        store.ensure_schema().unwrap();
        assert!(store.path().exists());
    }

    #[test]
    fn test_missing_table_is_storage_error() {
        let dir = tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("history.db"));
        let err = store.record_latest().unwrap_err();
        assert_eq!(err.kind(), "storage");
    }
}
