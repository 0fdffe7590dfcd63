//! Maildir filenames: unique-name generation and flag decoding.
//!
//! Names are written as `{unixSeconds}.{pid}.{host}_2,{flags}.eml`. The info
//! separator is `_` instead of Maildir's `:` because the sync client refuses
//! `:` in filenames on Windows. Both separators are accepted on read.

use std::sync::LazyLock;

use chrono::Utc;
use regex::Regex;

use crate::model::message::Flags;

/// File extension of every work item written by gtdmail.
pub const EML_EXTENSION: &str = ".eml";

static FLAG_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[_:]2,([A-Z]*)").expect("valid flag regex"));

/// The unique part of a Maildir filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueName {
    pub seconds: i64,
    pub pid: u32,
    pub host: String,
    /// Collision counter, appended to the pid component when set.
    pub sequence: Option<u32>,
}

impl UniqueName {
    /// Name for the current second, process and host.
    pub fn now(host: &str) -> Self {
        Self {
            seconds: Utc::now().timestamp(),
            pid: std::process::id(),
            host: sanitize_host(host),
            sequence: None,
        }
    }

    /// Same name with a collision counter.
    pub fn with_sequence(&self, sequence: u32) -> Self {
        Self {
            sequence: Some(sequence),
            ..self.clone()
        }
    }

    /// Full filename including the `_2,{flags}` info suffix and extension.
    pub fn filename(&self, flags: &str) -> String {
        let pid = match self.sequence {
            Some(n) => format!("{}_{n}", self.pid),
            None => self.pid.to_string(),
        };
        format!("{}.{pid}.{}_2,{flags}{EML_EXTENSION}", self.seconds, self.host)
    }
}

/// Generate a fresh filename on this host.
pub fn generate_filename(flags: Option<&str>, host: &str) -> String {
    UniqueName::now(host).filename(flags.unwrap_or(""))
}

/// Decode flags from a filename. A name without an info suffix has no flags set.
pub fn parse_flags(filename: &str) -> Flags {
    FLAG_SUFFIX
        .captures(filename)
        .and_then(|caps| caps.get(1))
        .map(|letters| Flags::from_letters(letters.as_str()))
        .unwrap_or_default()
}

/// Best-effort host name for unique filenames.
pub fn local_hostname() -> String {
    let from_env = std::env::var("HOSTNAME").ok();
    let from_file = || {
        std::fs::read_to_string("/etc/hostname")
            .ok()
            .map(|s| s.trim().to_string())
    };
    from_env
        .or_else(from_file)
        .filter(|h| !h.is_empty())
        .map(|h| sanitize_host(&h))
        .unwrap_or_else(|| "localhost".to_string())
}

/// Escape characters Maildir reserves in the host component.
fn sanitize_host(host: &str) -> String {
    host.trim().replace('/', "\\057").replace(':', "\\072")
}
