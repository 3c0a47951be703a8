//! SQLite-backed context store for production use.
//!
//! One row per call id. Every operation opens its own connection and, for
//! writes, its own transaction, so no handle is held between calls and
//! several processes can share the same file.

use super::{ContextStore, StoreKind, ensure_call_id};
use crate::error::ContextError;
use crate::expiry::{Clock, ExpiryPolicy, SystemClock};
use crate::model::ContextRecord;
use log::{debug, error, info, warn};
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// How long a connection waits on a locked database before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS call_contexts (
    call_id TEXT PRIMARY KEY,
    context_data TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL,
    expires_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_call_contexts_expires_at
    ON call_contexts(expires_at);
";

/// Durable store in a single SQLite table with an indexed expiry column.
///
/// Timestamps in the table are UTC milliseconds; the record body keeps its
/// own ISO-8601 timestamps.
#[derive(Debug)]
pub struct SqliteContextStore {
    path: PathBuf,
    policy: ExpiryPolicy,
    clock: Arc<dyn Clock>,
}

impl SqliteContextStore {
    /// Open (creating if needed) the database file and its schema.
    pub fn open(path: impl AsRef<Path>, policy: ExpiryPolicy) -> Result<Self, ContextError> {
        Self::open_with_clock(path, policy, Arc::new(SystemClock))
    }

    pub fn open_with_clock(
        path: impl AsRef<Path>,
        policy: ExpiryPolicy,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ContextError> {
        let store = Self {
            path: path.as_ref().to_path_buf(),
            policy,
            clock,
        };
        store.ensure_parent_dir()?;
        let conn = store.connect()?;
        conn.execute_batch(SCHEMA)?;
        info!(
            "initialized sqlite context store (path={}, ttl_secs={})",
            store.path.display(),
            policy.ttl().num_seconds()
        );
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_parent_dir(&self) -> Result<(), ContextError> {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent)?,
            _ => {}
        }
        Ok(())
    }

    /// Open a short-lived connection for one operation.
    fn connect(&self) -> Result<Connection, ContextError> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.pragma_update(None, "journal_mode", "WAL").ok();
        conn.pragma_update(None, "synchronous", "NORMAL").ok();
        Ok(conn)
    }

    fn try_save(&self, record: &ContextRecord) -> Result<(), ContextError> {
        ensure_call_id(&record.call_id)?;
        let now = self.clock.now();
        let now_ms = now.timestamp_millis();

        let mut conn = self.connect()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let existing: Option<String> = tx
            .query_row(
                "SELECT context_data FROM call_contexts WHERE call_id = ?1 AND expires_at > ?2",
                params![record.call_id, now_ms],
                |row| row.get(0),
            )
            .optional()?;

        let mut stored = record.clone();
        stored.updated_at = now;
        if let Some(raw) = existing {
            match ContextRecord::from_json(&raw) {
                Ok(previous) => stored.created_at = previous.created_at,
                Err(err) => warn!(
                    "replacing unreadable context (call_id={}): {err}",
                    record.call_id
                ),
            }
        }
        let expires_at = self.policy.expires_at(&stored);
        let body = stored.to_json()?;

        tx.execute(
            "INSERT INTO call_contexts (call_id, context_data, created_at, updated_at, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(call_id) DO UPDATE SET
                context_data = excluded.context_data,
                created_at = excluded.created_at,
                updated_at = excluded.updated_at,
                expires_at = excluded.expires_at",
            params![
                stored.call_id,
                body,
                stored.created_at.timestamp_millis(),
                now_ms,
                expires_at.timestamp_millis()
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn try_get(&self, call_id: &str) -> Result<Option<ContextRecord>, ContextError> {
        ensure_call_id(call_id)?;
        let now_ms = self.clock.now().timestamp_millis();
        let conn = self.connect()?;
        let raw: Option<String> = conn
            .query_row(
                "SELECT context_data FROM call_contexts WHERE call_id = ?1 AND expires_at > ?2",
                params![call_id, now_ms],
                |row| row.get(0),
            )
            .optional()?;
        raw.map(|raw| ContextRecord::from_json(&raw)).transpose()
    }

    fn try_delete(&self, call_id: &str) -> Result<usize, ContextError> {
        ensure_call_id(call_id)?;
        let conn = self.connect()?;
        let removed = conn.execute(
            "DELETE FROM call_contexts WHERE call_id = ?1",
            params![call_id],
        )?;
        Ok(removed)
    }

    fn try_cleanup(&self) -> Result<usize, ContextError> {
        let now_ms = self.clock.now().timestamp_millis();
        let conn = self.connect()?;
        let removed = conn.execute(
            "DELETE FROM call_contexts WHERE expires_at <= ?1",
            params![now_ms],
        )?;
        Ok(removed)
    }
}

impl ContextStore for SqliteContextStore {
    fn save(&self, record: &ContextRecord) -> bool {
        match self.try_save(record) {
            Ok(()) => {
                info!("saved context (call_id={})", record.call_id);
                true
            }
            Err(err) => {
                error!(
                    "failed to save context (call_id={}): {err}",
                    record.call_id
                );
                false
            }
        }
    }

    fn get(&self, call_id: &str) -> Option<ContextRecord> {
        match self.try_get(call_id) {
            Ok(Some(record)) => {
                debug!("retrieved context (call_id={call_id})");
                Some(record)
            }
            Ok(None) => {
                debug!("no live context found (call_id={call_id})");
                None
            }
            Err(err) => {
                error!("failed to retrieve context (call_id={call_id}): {err}");
                None
            }
        }
    }

    fn delete(&self, call_id: &str) -> bool {
        match self.try_delete(call_id) {
            Ok(removed) => {
                if removed > 0 {
                    info!("deleted context (call_id={call_id})");
                } else {
                    debug!("delete of absent context (call_id={call_id})");
                }
                true
            }
            Err(err) => {
                error!("failed to delete context (call_id={call_id}): {err}");
                false
            }
        }
    }

    fn cleanup_expired(&self) -> usize {
        match self.try_cleanup() {
            Ok(removed) => {
                if removed > 0 {
                    info!("cleaned up expired contexts (removed={removed})");
                }
                removed
            }
            Err(err) => {
                error!("failed to clean up expired contexts: {err}");
                0
            }
        }
    }

    fn kind(&self) -> StoreKind {
        StoreKind::Sqlite
    }
}
