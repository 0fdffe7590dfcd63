//! Work items: a decoded `.eml` message plus its Maildir flags and GTD metadata.

use chrono::{DateTime, Utc};

use super::address::EmailAddress;
use super::mailbox::Folder;

/// GTD priority carried in `X-GTD-Priority`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    /// Case-insensitive parse; anything else is `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown priority '{s}' (expected high|medium|low)"))
    }
}

/// Optional GTD headers. Each field maps to one `X-GTD-*` header.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GtdMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

/// Maildir flags decoded from the filename suffix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Flags {
    pub seen: bool,
    pub replied: bool,
    pub flagged: bool,
    pub draft: bool,
    pub trashed: bool,
}

impl Flags {
    /// Decode flag letters; unknown letters are ignored.
    pub fn from_letters(letters: &str) -> Self {
        let mut flags = Self::default();
        for ch in letters.chars() {
            match ch {
                'S' => flags.seen = true,
                'R' => flags.replied = true,
                'F' => flags.flagged = true,
                'D' => flags.draft = true,
                'T' => flags.trashed = true,
                _ => {}
            }
        }
        flags
    }

    /// Encode in ASCII order, as Maildir readers expect.
    pub fn to_letters(self) -> String {
        let mut out = String::with_capacity(5);
        for (set, letter) in [
            (self.draft, 'D'),
            (self.flagged, 'F'),
            (self.replied, 'R'),
            (self.seen, 'S'),
            (self.trashed, 'T'),
        ] {
            if set {
                out.push(letter);
            }
        }
        out
    }
}

/// An attachment with its decoded payload.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Attachment {
    pub filename: String,
    pub content_type: String,
    /// Payload bytes. Not serialized; `size` is reported instead.
    #[serde(skip)]
    pub content: Vec<u8>,
    #[serde(default)]
    pub size: u64,
}

impl Attachment {
    pub fn new(
        filename: impl Into<String>,
        content_type: impl Into<String>,
        content: Vec<u8>,
    ) -> Self {
        let size = content.len() as u64;
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            content,
            size,
        }
    }
}

/// A decoded work item.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Message {
    /// Maildir filename, unique within the mailbox.
    pub filename: String,
    /// Folder the message was read from, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<Folder>,
    pub message_id: String,
    pub from: Vec<EmailAddress>,
    pub to: Vec<EmailAddress>,
    pub subject: String,
    pub date: DateTime<Utc>,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    pub flags: Flags,
    pub gtd: GtdMetadata,
    /// Size on disk in bytes, when the message came from storage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

/// Input to the `.eml` encoder.
#[derive(Debug, Clone, Default)]
pub struct Draft {
    pub from: Vec<EmailAddress>,
    pub to: Vec<EmailAddress>,
    pub subject: String,
    pub text: String,
    pub html: Option<String>,
    pub attachments: Vec<Attachment>,
    pub gtd: GtdMetadata,
    /// Generated when absent.
    pub message_id: Option<String>,
    /// Current time when absent.
    pub date: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_from_letters_ignores_unknown() {
        let flags = Flags::from_letters("SXF");
        assert!(flags.seen);
        assert!(flags.flagged);
        assert!(!flags.replied);
        assert!(!flags.draft);
        assert!(!flags.trashed);
    }

    #[test]
    fn test_flags_to_letters_sorted() {
        let flags = Flags {
            seen: true,
            replied: true,
            flagged: false,
            draft: true,
            trashed: false,
        };
        assert_eq!(flags.to_letters(), "DRS");
        assert_eq!(Flags::default().to_letters(), "");
    }

    #[test]
    fn test_priority_parse() {
        assert_eq!(Priority::parse("HIGH"), Some(Priority::High));
        assert_eq!(Priority::parse(" low "), Some(Priority::Low));
        assert_eq!(Priority::parse("urgent"), None);
    }

    #[test]
    fn test_metadata_json_omits_absent_fields() {
        let meta = GtdMetadata {
            project: Some("Website".into()),
            ..Default::default()
        };
        let json = serde_json::to_string(&meta).unwrap();
        assert_eq!(json, r#"{"project":"Website"}"#);
    }
}
