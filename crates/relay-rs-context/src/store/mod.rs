//! Store backend contract, backend selection and the facade used by call stages.

mod memory;
mod sqlite;

pub use memory::InMemoryContextStore;
pub use sqlite::SqliteContextStore;

use crate::error::ContextError;
use crate::expiry::{Clock, ExpiryAnchor, ExpiryPolicy, SystemClock};
use crate::model::ContextRecord;
use chrono::Duration;
use log::info;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Storage contract shared by every backend.
///
/// None of the operations surface errors: failures are logged and folded
/// into the return value so a missed save never breaks the call flow.
pub trait ContextStore: Send + Sync {
    /// Upsert the record keyed by its call id, refreshing `updated_at`.
    fn save(&self, record: &ContextRecord) -> bool;
    /// Fetch a live record; expired or unreadable records are absent.
    fn get(&self, call_id: &str) -> Option<ContextRecord>;
    /// Remove a record. Removing an absent key succeeds.
    fn delete(&self, call_id: &str) -> bool;
    /// Remove every expired record, returning how many were removed.
    fn cleanup_expired(&self) -> usize;
    /// Backend kind, for diagnostics.
    fn kind(&self) -> StoreKind;
}

/// Concrete backend kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    /// Process-local map.
    Memory,
    /// SQLite file.
    Sqlite,
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreKind::Memory => f.write_str("in-memory"),
            StoreKind::Sqlite => f.write_str("sqlite"),
        }
    }
}

/// Startup-time backend choice.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreSelection {
    /// Volatile store; state is lost on restart.
    InMemory { ttl: Duration },
    /// Durable store in a SQLite file.
    Sqlite { path: PathBuf, ttl: Duration },
}

impl StoreSelection {
    /// Pick a backend from the database flag, falling back to each backend's
    /// default TTL when none is given.
    pub fn from_flag(
        use_database: bool,
        path: impl Into<PathBuf>,
        ttl: Option<Duration>,
    ) -> Self {
        if use_database {
            StoreSelection::Sqlite {
                path: path.into(),
                ttl: ttl.unwrap_or_else(|| ExpiryPolicy::durable_default().ttl()),
            }
        } else {
            StoreSelection::InMemory {
                ttl: ttl.unwrap_or_else(|| ExpiryPolicy::volatile_default().ttl()),
            }
        }
    }

    /// Record lifetime the selected backend will enforce.
    pub fn ttl(&self) -> Duration {
        match self {
            StoreSelection::InMemory { ttl } | StoreSelection::Sqlite { ttl, .. } => *ttl,
        }
    }
}

/// Single entry point for call stages; hides which backend is in use.
#[derive(Clone)]
pub struct ContextManager {
    store: Arc<dyn ContextStore>,
}

impl fmt::Debug for ContextManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextManager")
            .field("kind", &self.store.kind())
            .finish()
    }
}

impl ContextManager {
    /// Wrap an existing backend.
    pub fn new(store: Arc<dyn ContextStore>) -> Self {
        Self { store }
    }

    /// Open the selected backend with the system clock.
    pub fn open(selection: StoreSelection) -> Result<Self, ContextError> {
        Self::open_with_clock(selection, Arc::new(SystemClock))
    }

    /// Open the selected backend with an explicit clock.
    pub fn open_with_clock(
        selection: StoreSelection,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ContextError> {
        let store: Arc<dyn ContextStore> = match selection {
            StoreSelection::InMemory { ttl } => Arc::new(InMemoryContextStore::with_clock(
                ExpiryPolicy::new(ttl, ExpiryAnchor::Created),
                clock,
            )),
            StoreSelection::Sqlite { path, ttl } => Arc::new(SqliteContextStore::open_with_clock(
                path,
                ExpiryPolicy::new(ttl, ExpiryAnchor::Updated),
                clock,
            )?),
        };
        info!("context store ready (backend={})", store.kind());
        Ok(Self { store })
    }

    pub fn save(&self, record: &ContextRecord) -> bool {
        self.store.save(record)
    }

    pub fn get(&self, call_id: &str) -> Option<ContextRecord> {
        self.store.get(call_id)
    }

    pub fn delete(&self, call_id: &str) -> bool {
        self.store.delete(call_id)
    }

    pub fn cleanup_expired(&self) -> usize {
        self.store.cleanup_expired()
    }

    pub fn kind(&self) -> StoreKind {
        self.store.kind()
    }
}

/// Reject blank call ids before touching storage.
pub(crate) fn ensure_call_id(call_id: &str) -> Result<(), ContextError> {
    if call_id.trim().is_empty() {
        return Err(ContextError::InvalidCallId(call_id.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{ContextManager, StoreKind, StoreSelection};
    use crate::model::ContextRecord;
    use chrono::Duration;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;
    use tempfile::tempdir;

    #[test]
    fn flag_selects_backend_and_default_ttl() {
        assert_eq!(
            StoreSelection::from_flag(false, "unused.db", None),
            StoreSelection::InMemory {
                ttl: Duration::hours(1)
            }
        );
        assert_eq!(
            StoreSelection::from_flag(true, "ctx.db", None),
            StoreSelection::Sqlite {
                path: PathBuf::from("ctx.db"),
                ttl: Duration::hours(24)
            }
        );
        assert_eq!(
            StoreSelection::from_flag(true, "ctx.db", Some(Duration::hours(2))),
            StoreSelection::Sqlite {
                path: PathBuf::from("ctx.db"),
                ttl: Duration::hours(2)
            }
        );
        assert_eq!(
            StoreSelection::from_flag(false, "", Some(Duration::zero())).ttl(),
            Duration::zero()
        );
    }

    #[test]
    fn facade_hides_backend_choice() {
        let temp = tempdir().expect("tempdir");
        let selections = [
            StoreSelection::from_flag(false, "", None),
            StoreSelection::from_flag(true, temp.path().join("ctx.db"), None),
        ];
        let mut kinds = Vec::new();
        for selection in selections {
            let manager = ContextManager::open(selection).expect("open");
            let record = ContextRecord::new("C1").with_customer_name("Ada");
            assert!(manager.save(&record));
            let loaded = manager.get("C1").expect("record");
            assert_eq!(loaded.customer_name.as_deref(), Some("Ada"));
            assert!(manager.delete("C1"));
            assert_eq!(manager.get("C1"), None);
            kinds.push(manager.kind());
        }
        assert_eq!(kinds, vec![StoreKind::Memory, StoreKind::Sqlite]);
    }

    #[test]
    fn kind_display_names() {
        assert_eq!(StoreKind::Memory.to_string(), "in-memory");
        assert_eq!(StoreKind::Sqlite.to_string(), "sqlite");
    }
}
