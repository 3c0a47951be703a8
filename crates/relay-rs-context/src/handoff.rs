//! Stage hand-off helpers built on the context facade.
//!
//! The intake stage records what the caller said and tags the record; later
//! stages resume it by call id and add their own tag once.

use crate::model::ContextRecord;
use crate::store::ContextManager;
use log::{error, info, warn};

/// Tag written by the intake stage.
pub const TRIAGE_STAGE: &str = "triage";
/// Tag written by the sales specialist.
pub const SALES_STAGE: &str = "sales";
/// Tag written by the support specialist.
pub const SUPPORT_STAGE: &str = "support";

/// Caller-supplied fields gathered at intake.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallerDetails {
    pub customer_name: Option<String>,
    pub need_type: Option<String>,
    pub basic_info: Option<String>,
}

/// Result of recording intake details.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntakeOutcome {
    /// Context stored; the next stage can resume it.
    Saved,
    /// Storage failed; the call continues without saved context.
    NotSaved,
    /// The request carried no call id.
    MissingCallId,
}

/// Store intake details as a fresh record tagged with `stage`.
pub fn record_intake(
    manager: &ContextManager,
    call_id: Option<&str>,
    details: CallerDetails,
    stage: &str,
) -> IntakeOutcome {
    let Some(call_id) = usable_call_id(call_id) else {
        error!("no call id supplied for intake (stage={stage})");
        return IntakeOutcome::MissingCallId;
    };
    let mut record = ContextRecord::new(call_id);
    record.customer_name = details.customer_name;
    record.need_type = details.need_type;
    record.basic_info = details.basic_info;
    record.visit(stage);

    if manager.save(&record) {
        IntakeOutcome::Saved
    } else {
        warn!("continuing without saved context (call_id={call_id}, stage={stage})");
        IntakeOutcome::NotSaved
    }
}

/// Load the context for a later stage and tag it with that stage.
///
/// A failed re-save still returns the loaded record.
pub fn resume_for_stage(
    manager: &ContextManager,
    call_id: Option<&str>,
    stage: &str,
) -> Option<ContextRecord> {
    let Some(call_id) = usable_call_id(call_id) else {
        error!("no call id supplied for resume (stage={stage})");
        return None;
    };
    let mut record = manager.get(call_id)?;
    if record.visit(stage) {
        if manager.save(&record) {
            info!("stage joined call context (call_id={call_id}, stage={stage})");
        } else {
            warn!("failed to record stage visit (call_id={call_id}, stage={stage})");
        }
    }
    Some(record)
}

fn usable_call_id(call_id: Option<&str>) -> Option<&str> {
    call_id.filter(|id| !id.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::{
        CallerDetails, IntakeOutcome, SALES_STAGE, SUPPORT_STAGE, TRIAGE_STAGE, record_intake,
        resume_for_stage,
    };
    use crate::store::{ContextManager, InMemoryContextStore};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn manager() -> ContextManager {
        ContextManager::new(Arc::new(InMemoryContextStore::default()))
    }

    fn ada() -> CallerDetails {
        CallerDetails {
            customer_name: Some("Ada".to_string()),
            need_type: Some("support".to_string()),
            basic_info: Some("cracked screen".to_string()),
        }
    }

    #[test]
    fn intake_saves_tagged_record() {
        let manager = manager();
        assert_eq!(
            record_intake(&manager, Some("C1"), ada(), TRIAGE_STAGE),
            IntakeOutcome::Saved
        );
        let record = manager.get("C1").expect("record");
        assert_eq!(record.customer_name.as_deref(), Some("Ada"));
        assert_eq!(record.need_type.as_deref(), Some("support"));
        assert_eq!(record.agent_path, vec![TRIAGE_STAGE]);
    }

    #[test]
    fn intake_without_call_id_saves_nothing() {
        let manager = manager();
        assert_eq!(
            record_intake(&manager, None, ada(), TRIAGE_STAGE),
            IntakeOutcome::MissingCallId
        );
        assert_eq!(
            record_intake(&manager, Some(" "), ada(), TRIAGE_STAGE),
            IntakeOutcome::MissingCallId
        );
    }

    #[test]
    fn resume_appends_each_stage_once() {
        let manager = manager();
        record_intake(&manager, Some("C1"), ada(), TRIAGE_STAGE);

        let record = resume_for_stage(&manager, Some("C1"), SUPPORT_STAGE).expect("record");
        assert_eq!(record.agent_path, vec![TRIAGE_STAGE, SUPPORT_STAGE]);
        resume_for_stage(&manager, Some("C1"), SUPPORT_STAGE).expect("record");
        resume_for_stage(&manager, Some("C1"), SALES_STAGE).expect("record");

        let stored = manager.get("C1").expect("record");
        assert_eq!(
            stored.agent_path,
            vec![TRIAGE_STAGE, SUPPORT_STAGE, SALES_STAGE]
        );
    }

    #[test]
    fn resume_of_unknown_call_is_absent() {
        let manager = manager();
        assert_eq!(resume_for_stage(&manager, Some("nope"), SALES_STAGE), None);
        assert_eq!(resume_for_stage(&manager, None, SALES_STAGE), None);
    }
}
