//! Expiry policy and clock abstraction shared by the store backends.

use crate::model::ContextRecord;
use chrono::{DateTime, Duration, Utc};
use std::fmt;

/// Default TTL for the durable backend, in hours.
pub const DURABLE_DEFAULT_TTL_HOURS: u64 = 24;
/// Default TTL for the volatile backend, in hours.
pub const VOLATILE_DEFAULT_TTL_HOURS: u64 = 1;

/// Wall-clock source for expiry decisions.
///
/// Stores take an injected clock so tests can move time forward.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Current wall-clock time.
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Which record timestamp the TTL is measured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryAnchor {
    /// Age since the first write; repeated saves do not extend the life.
    Created,
    /// Age since the last write; every save extends the life.
    Updated,
}

/// Uniform TTL applied to every record in one store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryPolicy {
    ttl: Duration,
    anchor: ExpiryAnchor,
}

impl ExpiryPolicy {
    pub fn new(ttl: Duration, anchor: ExpiryAnchor) -> Self {
        let ttl = if ttl < Duration::zero() {
            Duration::zero()
        } else {
            ttl
        };
        Self { ttl, anchor }
    }

    /// Policy with a TTL given in whole hours.
    pub fn from_hours(hours: u64, anchor: ExpiryAnchor) -> Self {
        Self::new(hours_to_duration(hours), anchor)
    }

    /// One hour, measured from creation.
    pub fn volatile_default() -> Self {
        Self::from_hours(VOLATILE_DEFAULT_TTL_HOURS, ExpiryAnchor::Created)
    }

    /// Twenty-four hours, measured from the last save.
    pub fn durable_default() -> Self {
        Self::from_hours(DURABLE_DEFAULT_TTL_HOURS, ExpiryAnchor::Updated)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn anchor(&self) -> ExpiryAnchor {
        self.anchor
    }

    /// Instant after which the record is logically absent.
    pub fn expires_at(&self, record: &ContextRecord) -> DateTime<Utc> {
        let anchor = match self.anchor {
            ExpiryAnchor::Created => record.created_at,
            ExpiryAnchor::Updated => record.updated_at,
        };
        anchor
            .checked_add_signed(self.ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// A record is live only while `now < expires_at`.
    pub fn is_expired(&self, record: &ContextRecord, now: DateTime<Utc>) -> bool {
        now >= self.expires_at(record)
    }
}

/// Convert whole hours to a duration, saturating on overflow.
pub fn hours_to_duration(hours: u64) -> Duration {
    i64::try_from(hours)
        .ok()
        .and_then(Duration::try_hours)
        .unwrap_or(Duration::MAX)
}

#[cfg(test)]
mod tests {
    use super::{ExpiryAnchor, ExpiryPolicy, hours_to_duration};
    use crate::model::ContextRecord;
    use chrono::{Duration, TimeZone, Utc};
    use pretty_assertions::assert_eq;

    #[test]
    fn anchors_pick_the_matching_timestamp() {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut record = ContextRecord::new_at("C1", created);
        record.updated_at = created + Duration::minutes(30);

        let by_created = ExpiryPolicy::from_hours(1, ExpiryAnchor::Created);
        let by_updated = ExpiryPolicy::from_hours(1, ExpiryAnchor::Updated);
        assert_eq!(by_created.expires_at(&record), created + Duration::hours(1));
        assert_eq!(
            by_updated.expires_at(&record),
            created + Duration::minutes(90)
        );

        let later = created + Duration::minutes(75);
        assert!(by_created.is_expired(&record, later));
        assert!(!by_updated.is_expired(&record, later));
    }

    #[test]
    fn zero_ttl_expires_at_the_anchor() {
        let now = Utc::now();
        let record = ContextRecord::new_at("C2", now);
        let policy = ExpiryPolicy::new(Duration::zero(), ExpiryAnchor::Updated);
        assert!(policy.is_expired(&record, now));
    }

    #[test]
    fn negative_ttl_clamps_to_zero() {
        let policy = ExpiryPolicy::new(Duration::seconds(-5), ExpiryAnchor::Created);
        assert_eq!(policy.ttl(), Duration::zero());
    }

    #[test]
    fn huge_ttl_saturates() {
        assert_eq!(hours_to_duration(u64::MAX), Duration::MAX);
        let policy = ExpiryPolicy::from_hours(u64::MAX, ExpiryAnchor::Updated);
        let record = ContextRecord::new("C3");
        assert!(!policy.is_expired(&record, Utc::now()));
    }

    #[test]
    fn defaults_match_backend_roles() {
        assert_eq!(ExpiryPolicy::volatile_default().ttl(), Duration::hours(1));
        assert_eq!(
            ExpiryPolicy::volatile_default().anchor(),
            ExpiryAnchor::Created
        );
        assert_eq!(ExpiryPolicy::durable_default().ttl(), Duration::hours(24));
        assert_eq!(
            ExpiryPolicy::durable_default().anchor(),
            ExpiryAnchor::Updated
        );
    }
}
