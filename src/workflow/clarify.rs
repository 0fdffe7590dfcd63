//! Clarify: turn a caller's judgment about an item into a decision record.
//!
//! Pure. Picking the physical folder is left to the organize step.

use std::fmt;
use std::str::FromStr;

use chrono::Utc;

use super::event::WorkflowEvent;
use crate::model::mailbox::Folder;

/// Terminal disposition of a clarified item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    NextAction,
    Project,
    WaitingFor,
    Reference,
    SomedayMaybe,
    Trash,
}

impl Outcome {
    pub const ALL: [Outcome; 6] = [
        Outcome::NextAction,
        Outcome::Project,
        Outcome::WaitingFor,
        Outcome::Reference,
        Outcome::SomedayMaybe,
        Outcome::Trash,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::NextAction => "next_action",
            Self::Project => "project",
            Self::WaitingFor => "waiting_for",
            Self::Reference => "reference",
            Self::SomedayMaybe => "someday_maybe",
            Self::Trash => "trash",
        }
    }

    pub fn recommendation(self) -> &'static str {
        match self {
            Self::NextAction => "Add to Next Actions with context tags",
            Self::Project => "Create a project plan and define its first next action",
            Self::WaitingFor => "Track in Waiting For with a trigger or due date",
            Self::Reference => "Move to Reference",
            Self::SomedayMaybe => "Add to Someday/Maybe for review",
            Self::Trash => "Delete, no action",
        }
    }

    /// Destination folder. `Trash` has none: the item is deleted.
    pub fn target_folder(self) -> Option<Folder> {
        match self {
            Self::NextAction => Some(Folder::NextActions),
            Self::Project => Some(Folder::Projects),
            Self::WaitingFor => Some(Folder::WaitingFor),
            Self::Reference => Some(Folder::Reference),
            Self::SomedayMaybe => Some(Folder::SomedayMaybe),
            Self::Trash => None,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Outcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace('-', "_").to_ascii_lowercase();
        Outcome::ALL
            .into_iter()
            .find(|o| o.as_str() == wanted)
            .ok_or_else(|| format!("unknown outcome '{s}'"))
    }
}

/// The caller's judgment about one inbox item.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Clarification {
    pub what_is_it: String,
    pub is_actionable: bool,
    pub outcome: Outcome,
}

/// Output of [`clarify`].
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ClarifyDecision {
    pub what_is_it: String,
    pub is_actionable: bool,
    pub outcome: Outcome,
    pub recommended_action: String,
    pub event: WorkflowEvent,
}

pub fn clarify(clarification: Clarification) -> ClarifyDecision {
    ClarifyDecision {
        what_is_it: clarification.what_is_it.clone(),
        is_actionable: clarification.is_actionable,
        outcome: clarification.outcome,
        recommended_action: clarification.outcome.recommendation().to_string(),
        event: WorkflowEvent::InboxItemClarified {
            timestamp: Utc::now(),
            clarification,
        },
    }
}
