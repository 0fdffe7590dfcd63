//! Mailboxes and their fixed set of folders.

use std::fmt;
use std::str::FromStr;

/// Parent directory a mailbox lives under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Organization,
    Person,
}

impl Category {
    /// Workspace-relative parent directory for this category.
    pub fn parent_dir(self) -> &'static str {
        match self {
            Self::Organization => "Organization",
            Self::Person => "People",
        }
    }
}

/// Who reads a person mailbox. A `+tag` in the address marks an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MailboxKind {
    Human,
    AiAgent,
}

impl MailboxKind {
    pub fn for_address(address: &str) -> Self {
        if address.contains('+') {
            Self::AiAgent
        } else {
            Self::Human
        }
    }
}

/// A resolved mailbox.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Mailbox {
    /// Case-sensitive identity, equal to the directory name.
    pub address: String,
    /// Workspace-relative root, e.g. `People/kevin@swoft.ai`.
    pub path: String,
    pub category: Category,
    /// Only set for person mailboxes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<MailboxKind>,
}

impl Mailbox {
    pub fn new(address: impl Into<String>, category: Category) -> Self {
        let address = address.into();
        let kind = match category {
            Category::Person => Some(MailboxKind::for_address(&address)),
            Category::Organization => None,
        };
        Self {
            path: format!("{}/{address}", category.parent_dir()),
            address,
            category,
            kind,
        }
    }
}

/// Every folder a mailbox holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Folder {
    #[serde(rename = "new")]
    New,
    #[serde(rename = "cur")]
    Cur,
    #[serde(rename = "tmp")]
    Tmp,
    #[serde(rename = "Next-Actions")]
    NextActions,
    #[serde(rename = "Waiting-For")]
    WaitingFor,
    #[serde(rename = "Projects")]
    Projects,
    #[serde(rename = "Someday-Maybe")]
    SomedayMaybe,
    #[serde(rename = "Reference")]
    Reference,
}

impl Folder {
    pub const ALL: [Folder; 8] = [
        Folder::New,
        Folder::Cur,
        Folder::Tmp,
        Folder::NextActions,
        Folder::WaitingFor,
        Folder::Projects,
        Folder::SomedayMaybe,
        Folder::Reference,
    ];

    /// Probe order for single-message reads. The earlier folder wins.
    pub const READ_ORDER: [Folder; 7] = [
        Folder::New,
        Folder::Cur,
        Folder::NextActions,
        Folder::WaitingFor,
        Folder::Projects,
        Folder::SomedayMaybe,
        Folder::Reference,
    ];

    /// Pre-clarification folders a move may take a message from.
    pub const STAGING: [Folder; 2] = [Folder::New, Folder::Cur];

    /// Logical folder name, without the leading dot.
    pub fn name(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Cur => "cur",
            Self::Tmp => "tmp",
            Self::NextActions => "Next-Actions",
            Self::WaitingFor => "Waiting-For",
            Self::Projects => "Projects",
            Self::SomedayMaybe => "Someday-Maybe",
            Self::Reference => "Reference",
        }
    }

    /// Directory name on disk. `new`, `cur` and `tmp` map to themselves, the rest are dot-prefixed.
    pub fn dir_name(self) -> String {
        match self {
            Self::New | Self::Cur | Self::Tmp => self.name().to_string(),
            other => format!(".{}", other.name()),
        }
    }
}

impl fmt::Display for Folder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Folder {
    type Err = String;

    /// Accepts the logical name or the dot-prefixed directory name, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().trim_start_matches('.').replace('_', "-");
        Folder::ALL
            .into_iter()
            .find(|folder| folder.name().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| format!("unknown folder '{s}'"))
    }
}
