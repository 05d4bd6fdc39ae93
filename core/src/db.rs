use std::path::Path;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Local;
use rusqlite::{Connection, params};

use crate::error::LedgerError;
use crate::models::{DayKey, LedgerSnapshot, LogEntry, UserProfile};

pub const KEY_PROFILE: &str = "nutri_user";
pub const KEY_LOG: &str = "nutri_log";
pub const KEY_DAY: &str = "nutri_date";

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Durable home of a [`LedgerSnapshot`].
///
/// `load` is called once when a ledger is hydrated; `save` after every
/// mutation. Implementations must return what they were given unchanged.
pub trait LedgerStore: Send {
    fn load(&self) -> crate::Result<Option<LedgerSnapshot>>;
    fn save(&self, snapshot: &LedgerSnapshot) -> crate::Result<()>;
}

impl<S: LedgerStore + ?Sized> LedgerStore for Box<S> {
    fn load(&self) -> crate::Result<Option<LedgerSnapshot>> {
        (**self).load()
    }

    fn save(&self, snapshot: &LedgerSnapshot) -> crate::Result<()> {
        (**self).save(snapshot)
    }
}

// --- SQLite key-value store ---

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_timeout(path, BUSY_TIMEOUT)
    }

    /// Open with a custom lock wait; a store locked for longer than
    /// `busy_timeout` fails instead of blocking.
    pub fn open_with_timeout(path: &Path, busy_timeout: Duration) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        let store = SqliteStore { conn };
        store.configure(busy_timeout)?;
        store.migrate()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = SqliteStore { conn };
        store.configure(BUSY_TIMEOUT)?;
        store.migrate()?;
        Ok(store)
    }

    fn configure(&self, busy_timeout: Duration) -> Result<()> {
        self.conn
            .busy_timeout(busy_timeout)
            .context("Failed to set busy timeout")?;
        Ok(())
    }

    fn migrate(&self) -> Result<()> {
        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS kv_store (
                    key TEXT PRIMARY KEY,
                    value TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                PRAGMA user_version = 1;",
            )?;
        }

        Ok(())
    }

    // --- Raw key-value access ---

    pub fn set_value(&self, key: &str, value: &str) -> Result<()> {
        let now = Local::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO kv_store (key, value, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, now],
        )?;
        Ok(())
    }

    pub fn get_value(&self, key: &str) -> Result<Option<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT value FROM kv_store WHERE key = ?1")?;
        let mut rows = stmt.query(params![key])?;
        if let Some(row) = rows.next()? {
            Ok(Some(row.get(0)?))
        } else {
            Ok(None)
        }
    }

    // --- Snapshot ---

    pub fn read_snapshot(&self) -> Result<Option<LedgerSnapshot>> {
        let Some(day_raw) = self.get_value(KEY_DAY)? else {
            return Ok(None);
        };
        let day_key: DayKey = day_raw
            .parse()
            .with_context(|| format!("Invalid stored day key '{day_raw}'"))?;

        let profile: Option<UserProfile> = match self.get_value(KEY_PROFILE)? {
            Some(raw) => serde_json::from_str(&raw).context("Invalid stored profile")?,
            None => None,
        };

        let entries: Vec<LogEntry> = match self.get_value(KEY_LOG)? {
            Some(raw) => serde_json::from_str(&raw).context("Invalid stored log")?,
            None => Vec::new(),
        };

        Ok(Some(LedgerSnapshot {
            profile,
            day_key,
            entries,
        }))
    }

    pub fn write_snapshot(&self, snapshot: &LedgerSnapshot) -> Result<()> {
        let profile = serde_json::to_string(&snapshot.profile)?;
        let log = serde_json::to_string(&snapshot.entries)?;
        let day = snapshot.day_key.to_string();

        let tx = self
            .conn
            .unchecked_transaction()
            .context("Failed to begin snapshot transaction")?;
        self.set_value(KEY_PROFILE, &profile)?;
        self.set_value(KEY_LOG, &log)?;
        self.set_value(KEY_DAY, &day)?;
        tx.commit().context("Failed to commit snapshot")?;
        Ok(())
    }
}

impl LedgerStore for SqliteStore {
    fn load(&self) -> crate::Result<Option<LedgerSnapshot>> {
        let snapshot = self
            .read_snapshot()
            .context("Failed to load ledger snapshot")
            .map_err(LedgerError::Persistence)?;
        tracing::debug!(found = snapshot.is_some(), "loaded ledger snapshot");
        Ok(snapshot)
    }

    fn save(&self, snapshot: &LedgerSnapshot) -> crate::Result<()> {
        self.write_snapshot(snapshot)
            .context("Failed to save ledger snapshot")
            .map_err(LedgerError::Persistence)?;
        tracing::debug!(
            day = %snapshot.day_key,
            entries = snapshot.entries.len(),
            "saved ledger snapshot"
        );
        Ok(())
    }
}

// --- In-memory store ---

/// Keeps the snapshot as serialized JSON, so it goes through the same
/// encoding as the durable store.
#[derive(Default)]
pub struct MemoryStore {
    data: Mutex<Option<String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: &LedgerSnapshot) -> crate::Result<Self> {
        let store = Self::new();
        store.save(snapshot)?;
        Ok(store)
    }
}

impl LedgerStore for MemoryStore {
    fn load(&self) -> crate::Result<Option<LedgerSnapshot>> {
        let data = self.data.lock().unwrap_or_else(PoisonError::into_inner);
        data.as_deref()
            .map(serde_json::from_str::<LedgerSnapshot>)
            .transpose()
            .context("Invalid in-memory snapshot")
            .map_err(LedgerError::Persistence)
    }

    fn save(&self, snapshot: &LedgerSnapshot) -> crate::Result<()> {
        let json = serde_json::to_string(snapshot)
            .context("Failed to encode snapshot")
            .map_err(LedgerError::Persistence)?;
        *self.data.lock().unwrap_or_else(PoisonError::into_inner) = Some(json);
        Ok(())
    }
}
