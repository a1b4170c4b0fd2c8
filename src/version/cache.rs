//! Expiring blob cache
//!
//! Blobs live as plain files under `objects/`, while their expiry timestamps
//! are kept in an SQLite index under `metadata/index.db`.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::{Connection, OptionalExtension};
use tracing::{debug, info, warn};

use crate::version::error::CacheError;

const METADATA_DIR: &str = "metadata";
const OBJECTS_DIR: &str = "objects";
const INDEX_FILE: &str = "index.db";

pub struct Cache {
    conn: Mutex<Connection>,
    objects_dir: PathBuf,
}

impl Cache {
    /// Opens (or creates) a cache rooted at `root`
    pub fn new(root: &Path) -> Result<Self, CacheError> {
        let metadata_dir = root.join(METADATA_DIR);
        let objects_dir = root.join(OBJECTS_DIR);
        std::fs::create_dir_all(&metadata_dir)?;
        std::fs::create_dir_all(&objects_dir)?;

        let db_path = metadata_dir.join(INDEX_FILE);
        info!("Initializing cache index at {:?}", db_path);

        let conn = Connection::open(&db_path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        let cache = Self {
            conn: Mutex::new(conn),
            objects_dir,
        };
        cache.create_schema()?;

        Ok(cache)
    }

    fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>, CacheError> {
        self.conn.lock().map_err(|_| CacheError::LockPoisoned)
    }

    fn current_timestamp_ms() -> i64 {
        chrono::Utc::now().timestamp_millis()
    }

    fn create_schema(&self) -> Result<(), CacheError> {
        let conn = self.lock_conn()?;
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS entries (
                key TEXT PRIMARY KEY,
                expires_at INTEGER NOT NULL
            )
            "#,
            [],
        )?;
        Ok(())
    }

    fn object_path(&self, key: &str) -> Result<PathBuf, CacheError> {
        if key.is_empty() || key == "." || key == ".." || key.contains(['/', '\\']) {
            return Err(CacheError::InvalidKey(key.to_string()));
        }
        Ok(self.objects_dir.join(key))
    }

    /// Returns the cached content for `key`.
    ///
    /// `None` means the key was never cached, expired, or its blob is gone.
    /// Expired entries are removed.
    pub fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let object_path = self.object_path(key)?;
        let conn = self.lock_conn()?;

        let expires_at: Option<i64> = conn
            .query_row(
                "SELECT expires_at FROM entries WHERE key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()?;

        let Some(expires_at) = expires_at else {
            return Ok(None);
        };

        if expires_at <= Self::current_timestamp_ms() {
            debug!("Cache entry {} expired", key);
            if let Err(e) = std::fs::remove_file(&object_path)
                && e.kind() != std::io::ErrorKind::NotFound
            {
                warn!("Failed to remove expired cache object {:?}: {}", object_path, e);
            }
            conn.execute("DELETE FROM entries WHERE key = ?1", [key])?;
            return Ok(None);
        }

        match std::fs::read(&object_path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Stores `content` under `key` for `ttl`
    pub fn set(&self, key: &str, content: &[u8], ttl: Duration) -> Result<(), CacheError> {
        let object_path = self.object_path(key)?;
        std::fs::write(&object_path, content)?;

        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        let expires_at = Self::current_timestamp_ms().saturating_add(ttl_ms);

        let conn = self.lock_conn()?;
        conn.execute(
            r#"
            INSERT INTO entries (key, expires_at) VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET expires_at = excluded.expires_at
            "#,
            (key, expires_at),
        )?;

        debug!("Cached {} ({} bytes)", key, content.len());
        Ok(())
    }
}
