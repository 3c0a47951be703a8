//! Process-local context store for development use.

use super::{ContextStore, StoreKind, ensure_call_id};
use crate::error::ContextError;
use crate::expiry::{Clock, ExpiryPolicy, SystemClock};
use crate::model::ContextRecord;
use log::{debug, error, info, warn};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// In-memory store; state is lost on restart and not shared across processes.
///
/// Expiry is measured from each record's `created_at` at read time.
#[derive(Debug)]
pub struct InMemoryContextStore {
    records: Mutex<HashMap<String, ContextRecord>>,
    policy: ExpiryPolicy,
    clock: Arc<dyn Clock>,
}

impl Default for InMemoryContextStore {
    fn default() -> Self {
        Self::new(ExpiryPolicy::volatile_default())
    }
}

impl InMemoryContextStore {
    pub fn new(policy: ExpiryPolicy) -> Self {
        Self::with_clock(policy, Arc::new(SystemClock))
    }

    pub fn with_clock(policy: ExpiryPolicy, clock: Arc<dyn Clock>) -> Self {
        info!(
            "initialized in-memory context store (ttl_secs={})",
            policy.ttl().num_seconds()
        );
        Self {
            records: Mutex::new(HashMap::new()),
            policy,
            clock,
        }
    }

    /// Number of entries held, expired or not.
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Returns the sweep count and whether the saved record itself was swept.
    fn try_save(&self, record: &ContextRecord) -> Result<(usize, bool), ContextError> {
        ensure_call_id(&record.call_id)?;
        let now = self.clock.now();
        let mut stored = record.clone();
        stored.updated_at = now;

        let mut records = self.records.lock();
        if let Some(existing) = records
            .get(&record.call_id)
            .filter(|existing| !self.policy.is_expired(existing, now))
        {
            stored.created_at = existing.created_at;
        }
        records.insert(stored.call_id.clone(), stored);
        let swept = sweep(&mut records, &self.policy, now);
        Ok((swept, !records.contains_key(&record.call_id)))
    }
}

/// Drop every expired entry from the map, returning how many went.
fn sweep(
    records: &mut HashMap<String, ContextRecord>,
    policy: &ExpiryPolicy,
    now: chrono::DateTime<chrono::Utc>,
) -> usize {
    let before = records.len();
    records.retain(|_, record| !policy.is_expired(record, now));
    before - records.len()
}

impl ContextStore for InMemoryContextStore {
    fn save(&self, record: &ContextRecord) -> bool {
        match self.try_save(record) {
            Ok((swept, arrived_expired)) => {
                if arrived_expired {
                    warn!(
                        "saved context already past its ttl and was swept (call_id={})",
                        record.call_id
                    );
                } else {
                    info!("saved context (call_id={})", record.call_id);
                }
                if swept > 0 {
                    info!("cleaned up expired contexts (removed={swept})");
                }
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
        let now = self.clock.now();
        let records = self.records.lock();
        let Some(record) = records.get(call_id) else {
            debug!("no context found (call_id={call_id})");
            return None;
        };
        if self.policy.is_expired(record, now) {
            debug!("context expired (call_id={call_id})");
            return None;
        }
        debug!("retrieved context (call_id={call_id})");
        Some(record.clone())
    }

    fn delete(&self, call_id: &str) -> bool {
        if let Err(err) = ensure_call_id(call_id) {
            warn!("refusing to delete context: {err}");
            return false;
        }
        if self.records.lock().remove(call_id).is_some() {
            info!("deleted context (call_id={call_id})");
        } else {
            debug!("delete of absent context (call_id={call_id})");
        }
        true
    }

    fn cleanup_expired(&self) -> usize {
        let now = self.clock.now();
        let removed = sweep(&mut self.records.lock(), &self.policy, now);
        if removed > 0 {
            info!("cleaned up expired contexts (removed={removed})");
        }
        removed
    }

    fn kind(&self) -> StoreKind {
        StoreKind::Memory
    }
}

#[cfg(test)]
mod tests {
    use super::InMemoryContextStore;
    use crate::expiry::{Clock, ExpiryAnchor, ExpiryPolicy};
    use crate::model::ContextRecord;
    use crate::store::ContextStore;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    #[derive(Debug)]
    struct StepClock {
        now: Mutex<DateTime<Utc>>,
    }

    impl StepClock {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                now: Mutex::new(Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()),
            })
        }

        fn advance(&self, by: Duration) {
            *self.now.lock() += by;
        }
    }

    impl Clock for StepClock {
        fn now(&self) -> DateTime<Utc> {
            *self.now.lock()
        }
    }

    fn store_with(clock: Arc<StepClock>) -> InMemoryContextStore {
        InMemoryContextStore::with_clock(ExpiryPolicy::volatile_default(), clock)
    }

    #[test]
    fn save_then_get_round_trips_fields() {
        let clock = StepClock::new();
        let store = store_with(clock.clone());
        let record = ContextRecord::new_at("C1", clock.now())
            .with_customer_name("Ada")
            .with_need_type("support")
            .with_basic_info("cracked screen")
            .with_stage("triage");
        assert!(store.save(&record));

        let loaded = store.get("C1").expect("record");
        assert_eq!(loaded.customer_name.as_deref(), Some("Ada"));
        assert_eq!(loaded.need_type.as_deref(), Some("support"));
        assert_eq!(loaded.basic_info.as_deref(), Some("cracked screen"));
        assert_eq!(loaded.agent_path, vec!["triage"]);
    }

    #[test]
    fn save_refreshes_updated_at_but_keeps_created_at() {
        let clock = StepClock::new();
        let store = store_with(clock.clone());
        let first = ContextRecord::new_at("C1", clock.now());
        assert!(store.save(&first));

        clock.advance(Duration::minutes(10));
        let replacement = ContextRecord::new_at("C1", clock.now()).with_basic_info("more");
        assert!(store.save(&replacement));

        let loaded = store.get("C1").expect("record");
        assert_eq!(loaded.created_at, first.created_at);
        assert_eq!(loaded.updated_at, clock.now());
        assert_eq!(loaded.basic_info.as_deref(), Some("more"));
    }

    #[test]
    fn get_hides_records_past_their_age_without_removing_them() {
        let clock = StepClock::new();
        let store = store_with(clock.clone());
        assert!(store.save(&ContextRecord::new_at("C1", clock.now())));

        clock.advance(Duration::minutes(59));
        assert!(store.get("C1").is_some());
        clock.advance(Duration::minutes(1));
        assert_eq!(store.get("C1"), None);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn repeated_saves_do_not_extend_the_created_anchor() {
        let clock = StepClock::new();
        let store = store_with(clock.clone());
        assert!(store.save(&ContextRecord::new_at("C1", clock.now())));
        clock.advance(Duration::minutes(50));
        let record = store.get("C1").expect("record");
        assert!(store.save(&record));
        clock.advance(Duration::minutes(15));
        assert_eq!(store.get("C1"), None);
    }

    #[test]
    fn save_sweeps_other_expired_entries() {
        let clock = StepClock::new();
        let store = store_with(clock.clone());
        assert!(store.save(&ContextRecord::new_at("old", clock.now())));
        clock.advance(Duration::hours(2));
        assert!(store.save(&ContextRecord::new_at("new", clock.now())));
        assert_eq!(store.len(), 1);
        assert!(store.get("new").is_some());
    }

    #[test]
    fn record_created_past_its_ttl_is_swept_on_arrival() {
        let clock = StepClock::new();
        let store = store_with(clock.clone());
        let stale = ContextRecord::new_at("C1", clock.now() - Duration::hours(2));
        assert!(store.save(&stale));
        assert!(store.is_empty());
        assert_eq!(store.get("C1"), None);

        assert!(store.save(&ContextRecord::new_at("C2", clock.now())));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn delete_is_idempotent() {
        let store = InMemoryContextStore::default();
        assert!(store.save(&ContextRecord::new("C1")));
        assert!(store.delete("C1"));
        assert_eq!(store.get("C1"), None);
        assert!(store.delete("C1"));
    }

    #[test]
    fn blank_call_id_is_rejected() {
        let store = InMemoryContextStore::default();
        assert!(!store.save(&ContextRecord::new("  ")));
        assert!(!store.delete(""));
        assert!(store.is_empty());
    }

    #[test]
    fn cleanup_counts_only_expired_records() {
        let clock = StepClock::new();
        let store = InMemoryContextStore::with_clock(
            ExpiryPolicy::new(Duration::minutes(30), ExpiryAnchor::Created),
            clock.clone(),
        );
        assert!(store.save(&ContextRecord::new_at("a", clock.now())));
        assert!(store.save(&ContextRecord::new_at("b", clock.now())));
        clock.advance(Duration::minutes(20));
        assert!(store.save(&ContextRecord::new_at("c", clock.now())));
        clock.advance(Duration::minutes(15));

        assert_eq!(store.cleanup_expired(), 2);
        assert_eq!(store.cleanup_expired(), 0);
        assert!(store.get("c").is_some());
        assert_eq!(store.len(), 1);
    }
}
