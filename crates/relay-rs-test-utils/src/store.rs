use relay_rs_context::{ContextRecord, ContextStore, StoreKind};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Store whose every operation fails, for exercising degraded paths.
#[derive(Debug, Default)]
pub struct FailingStore {
    calls: AtomicUsize,
}

impl FailingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of operations attempted against the store.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

impl ContextStore for FailingStore {
    fn save(&self, _record: &ContextRecord) -> bool {
        self.touch();
        false
    }

    fn get(&self, _call_id: &str) -> Option<ContextRecord> {
        self.touch();
        None
    }

    fn delete(&self, _call_id: &str) -> bool {
        self.touch();
        false
    }

    fn cleanup_expired(&self) -> usize {
        self.touch();
        0
    }

    fn kind(&self) -> StoreKind {
        StoreKind::Memory
    }
}

/// Store that serves one fixed record but refuses writes.
#[derive(Debug)]
pub struct ReadOnlyStore {
    record: ContextRecord,
}

impl ReadOnlyStore {
    pub fn new(record: ContextRecord) -> Self {
        Self { record }
    }
}

impl ContextStore for ReadOnlyStore {
    fn save(&self, _record: &ContextRecord) -> bool {
        false
    }

    fn get(&self, call_id: &str) -> Option<ContextRecord> {
        (call_id == self.record.call_id).then(|| self.record.clone())
    }

    fn delete(&self, _call_id: &str) -> bool {
        false
    }

    fn cleanup_expired(&self) -> usize {
        0
    }

    fn kind(&self) -> StoreKind {
        StoreKind::Memory
    }
}
