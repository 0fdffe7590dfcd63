//! Domain events emitted by workflow steps.

use chrono::{DateTime, Utc};

use super::clarify::Clarification;

/// Structured record of a workflow transition, serialized with a `type` tag.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type")]
pub enum WorkflowEvent {
    InboxItemClarified {
        timestamp: DateTime<Utc>,
        clarification: Clarification,
    },
    InboxItemArchived {
        aggregate_id: String,
        inbox_owner: String,
        timestamp: DateTime<Utc>,
    },
}

impl WorkflowEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::InboxItemClarified { .. } => "InboxItemClarified",
            Self::InboxItemArchived { .. } => "InboxItemArchived",
        }
    }
}
