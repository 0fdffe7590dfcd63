//! Collect: turn a raw team-inbox listing into clarifiable items.
//!
//! Status and priority here come from filename conventions only. They are
//! independent of the `X-GTD-Status` / `X-GTD-Priority` headers.

use chrono::{DateTime, Utc};

use crate::store::join;

/// Extensions recognized as work items.
pub const WORK_ITEM_EXTENSIONS: [&str; 3] = [".md", ".eml", ".txt"];

/// Prefixes written by the cooperating agent process; never collected.
pub const SYSTEM_PREFIXES: [&str; 2] = ["REPLY-", "PROCESSING-"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InferredStatus {
    Unclarified,
    Blocked,
    Delegated,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InferredPriority {
    High,
    Normal,
    Low,
}

/// A collected, not yet clarified, inbox entry.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct InboxItem {
    pub name: String,
    pub path: String,
    pub status: InferredStatus,
    pub priority: InferredPriority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Utc>>,
}

/// `INBOX-` → unclarified, `ISSUE-` → blocked, `REPLY-` → delegated.
pub fn infer_status(name: &str) -> InferredStatus {
    if name.starts_with("INBOX-") {
        InferredStatus::Unclarified
    } else if name.starts_with("ISSUE-") {
        InferredStatus::Blocked
    } else if name.starts_with("REPLY-") {
        InferredStatus::Delegated
    } else {
        InferredStatus::Unknown
    }
}

/// `HIGH`/`URGENT` → high, `NORMAL` → normal, `LOW` → low; otherwise normal.
///
/// Tokens are matched case-sensitively, so `follow-up` is not `LOW`.
pub fn infer_priority(name: &str) -> InferredPriority {
    if name.contains("HIGH") || name.contains("URGENT") {
        InferredPriority::High
    } else if name.contains("NORMAL") {
        InferredPriority::Normal
    } else if name.contains("LOW") {
        InferredPriority::Low
    } else {
        InferredPriority::Normal
    }
}

pub fn is_work_item(name: &str) -> bool {
    !name.ends_with('/')
        && !name.starts_with('.')
        && WORK_ITEM_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
        && !SYSTEM_PREFIXES.iter().any(|prefix| name.starts_with(prefix))
}

/// Filter and classify the entries of `dir`. Directory entries (ending in `/`)
/// and system files are dropped; order is preserved.
pub fn collect(dir: &str, entries: &[String]) -> Vec<InboxItem> {
    entries
        .iter()
        .filter(|name| is_work_item(name))
        .map(|name| InboxItem {
            name: name.clone(),
            path: join(dir, name),
            status: infer_status(name),
            priority: infer_priority(name),
            size: None,
            modified: None,
        })
        .collect()
}
