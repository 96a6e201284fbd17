use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{ProjectStore, PROJECTS_KEY};
use crate::error::Result;
use crate::state::data::ProjectMap;

/// The BlobStore is the primary, unbounded project store.
/// It keeps JSON documents in a single SQLite table, keyed by name.
pub struct BlobStore {
    conn: Connection,
    db_path: Option<PathBuf>,
}

impl BlobStore {
    /// Open or create the database file, creating its directory if needed
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(db_path)?;
        info!(path = %db_path.display(), "blob store opened");

        let store = BlobStore {
            conn,
            db_path: Some(db_path.to_path_buf()),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Volatile store, used by tests and when no data directory exists
    pub fn open_in_memory() -> Result<Self> {
        let store = BlobStore {
            conn: Connection::open_in_memory()?,
            db_path: None,
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create the blobs table if it doesn't exist
    fn init_schema(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS blobs (
                id              TEXT PRIMARY KEY,
                data            TEXT NOT NULL,
                saved_at        INTEGER NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    /// Get the path to the database file
    pub fn path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    pub fn get(&self, id: &str) -> Result<Option<String>> {
        let data = self
            .conn
            .query_row("SELECT data FROM blobs WHERE id = ?1", [id], |row| row.get(0))
            .optional()?;
        Ok(data)
    }

    /// Insert or replace a blob
    pub fn put(&self, id: &str, data: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO blobs (id, data, saved_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET data = excluded.data, saved_at = excluded.saved_at",
            params![id, data, Utc::now().timestamp_millis()],
        )?;
        debug!(id, bytes = data.len(), "blob written");
        Ok(())
    }

    pub fn delete(&self, id: &str) -> Result<bool> {
        let changed = self.conn.execute("DELETE FROM blobs WHERE id = ?1", [id])?;
        Ok(changed > 0)
    }

    /// When a blob was last written
    pub fn saved_at(&self, id: &str) -> Result<Option<DateTime<Utc>>> {
        let millis: Option<i64> = self
            .conn
            .query_row("SELECT saved_at FROM blobs WHERE id = ?1", [id], |row| row.get(0))
            .optional()?;
        Ok(millis.and_then(|m| Utc.timestamp_millis_opt(m).single()))
    }
}

impl ProjectStore for BlobStore {
    fn load(&self) -> Result<Option<ProjectMap>> {
        match self.get(PROJECTS_KEY)? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    fn save(&mut self, projects: &ProjectMap) -> Result<()> {
        let json = serde_json::to_string(projects)?;
        self.put(PROJECTS_KEY, &json)?;
        info!(size_kb = json.len() / 1024, "projects saved to blob store");
        Ok(())
    }
}

// Implement Debug for better error messages
impl std::fmt::Debug for BlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobStore")
            .field("db_path", &self.db_path)
            .finish()
    }
}
