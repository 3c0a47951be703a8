use chrono::{DateTime, Utc};
use relay_rs_context::ContextRecord;
use uuid::Uuid;

/// Fresh call id that will not collide across tests.
pub fn unique_call_id() -> String {
    format!("call-{}", Uuid::new_v4())
}

/// Intake-shaped record with all caller fields populated.
pub fn sample_record(call_id: &str, now: DateTime<Utc>) -> ContextRecord {
    ContextRecord::new_at(call_id, now)
        .with_customer_name("Ada")
        .with_need_type("support")
        .with_basic_info("cracked screen")
        .with_stage("triage")
}
