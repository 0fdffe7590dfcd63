//! Organize: archive a collected team-inbox item into `processed/`.

use chrono::Utc;

use super::event::WorkflowEvent;
use crate::error::{GtdError, Result};
use crate::store::join;

/// Team inbox directory of an owner: `Team/inbox-{owner}-claude`.
pub fn team_inbox_dir(owner: &str) -> String {
    format!("Team/inbox-{owner}-claude")
}

/// Archive directory inside an owner's team inbox.
pub fn processed_dir(owner: &str) -> String {
    join(&team_inbox_dir(owner), "processed")
}

/// A move to perform, plus the event to record once it is done.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ArchiveInstruction {
    pub source: String,
    pub target: String,
    pub instruction: String,
    pub event: WorkflowEvent,
}

/// Compute the archive move for `item` in `owner`'s team inbox.
pub fn organize(item: &str, owner: &str) -> Result<ArchiveInstruction> {
    let item = item.trim();
    let owner = owner.trim();
    if item.is_empty() || item.contains('/') || item == "." || item == ".." {
        return Err(GtdError::InvalidArgument(format!(
            "'{item}' is not a plain item name"
        )));
    }
    if owner.is_empty() || owner.contains('/') {
        return Err(GtdError::InvalidArgument(format!(
            "'{owner}' is not a valid inbox owner"
        )));
    }

    let source = join(&team_inbox_dir(owner), item);
    let target = join(&processed_dir(owner), item);
    Ok(ArchiveInstruction {
        instruction: format!("Move {source} to {target}"),
        source,
        target,
        event: WorkflowEvent::InboxItemArchived {
            aggregate_id: item.to_string(),
            inbox_owner: owner.to_string(),
            timestamp: Utc::now(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_organize_paths() {
        let plan = organize("INBOX-deploy.md", "kevin").unwrap();
        assert_eq!(plan.source, "Team/inbox-kevin-claude/INBOX-deploy.md");
        assert_eq!(plan.target, "Team/inbox-kevin-claude/processed/INBOX-deploy.md");
        match plan.event {
            WorkflowEvent::InboxItemArchived {
                aggregate_id,
                inbox_owner,
                ..
            } => {
                assert_eq!(aggregate_id, "INBOX-deploy.md");
                assert_eq!(inbox_owner, "kevin");
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_organize_rejects_nested_names() {
        assert!(organize("../secrets.md", "kevin").is_err());
        assert!(organize("", "kevin").is_err());
        assert!(organize("INBOX-1.md", "").is_err());
    }
}
