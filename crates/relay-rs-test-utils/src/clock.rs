use chrono::{DateTime, Duration, TimeZone, Utc};
use parking_lot::Mutex;
use relay_rs_context::Clock;
use std::sync::Arc;

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Arc<Self> {
        Arc::new(Self {
            now: Mutex::new(start),
        })
    }

    /// Clock pinned to a fixed, arbitrary instant.
    pub fn fixed() -> Arc<Self> {
        Self::new(
            Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0)
                .single()
                .unwrap_or_else(Utc::now),
        )
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock() = now;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}
