//! Call context record shared between call stages.

use crate::error::ContextError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// State carried between the stages of one phone call.
///
/// Saves replace the whole record, so callers read, modify and save again.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContextRecord {
    /// Call identifier assigned by the call platform.
    pub call_id: String,
    /// Caller name, once known.
    #[serde(default)]
    pub customer_name: Option<String>,
    /// Kind of inquiry (sales, support, ...), once known.
    #[serde(default)]
    pub need_type: Option<String>,
    /// Free-form details about the inquiry.
    #[serde(default)]
    pub basic_info: Option<String>,
    /// Stages that consumed this record, in visitation order.
    #[serde(default)]
    pub agent_path: Vec<String>,
    /// Open-ended extension values.
    #[serde(default)]
    pub metadata: Map<String, Value>,
    /// First write timestamp.
    pub created_at: DateTime<Utc>,
    /// Last successful write timestamp.
    pub updated_at: DateTime<Utc>,
}

impl ContextRecord {
    /// Create an empty record for a call, stamped with the current time.
    pub fn new(call_id: impl Into<String>) -> Self {
        Self::new_at(call_id, Utc::now())
    }

    /// Create an empty record for a call, stamped with `now`.
    pub fn new_at(call_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            call_id: call_id.into(),
            customer_name: None,
            need_type: None,
            basic_info: None,
            agent_path: Vec::new(),
            metadata: Map::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_customer_name(mut self, name: impl Into<String>) -> Self {
        self.customer_name = Some(name.into());
        self
    }

    pub fn with_need_type(mut self, need_type: impl Into<String>) -> Self {
        self.need_type = Some(need_type.into());
        self
    }

    pub fn with_basic_info(mut self, info: impl Into<String>) -> Self {
        self.basic_info = Some(info.into());
        self
    }

    /// Record a stage visit while building.
    pub fn with_stage(mut self, stage: impl Into<String>) -> Self {
        self.visit(stage);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Append a stage tag to the path unless it is already present.
    ///
    /// Returns true when the tag was added.
    pub fn visit(&mut self, stage: impl Into<String>) -> bool {
        let stage = stage.into();
        if self.agent_path.iter().any(|seen| *seen == stage) {
            return false;
        }
        self.agent_path.push(stage);
        true
    }

    /// Whether a stage has already consumed this record.
    pub fn visited(&self, stage: &str) -> bool {
        self.agent_path.iter().any(|seen| seen == stage)
    }

    /// Plain-text rendering for inclusion in a stage response.
    pub fn summary(&self) -> String {
        format!(
            "Customer: {}, Need: {}, Info: {}",
            self.customer_name.as_deref().unwrap_or("Unknown"),
            self.need_type.as_deref().unwrap_or("General"),
            self.basic_info.as_deref().unwrap_or("None provided")
        )
    }

    /// Serialize to the flat JSON form used by durable storage.
    pub fn to_json(&self) -> Result<String, ContextError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a record from its flat JSON form.
    pub fn from_json(raw: &str) -> Result<Self, ContextError> {
        Ok(serde_json::from_str(raw)?)
    }
}
