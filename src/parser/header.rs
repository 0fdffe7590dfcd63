//! RFC 5322 header block parsing: folding, case-insensitive lookup,
//! encoded-word (RFC 2047) decoding and date parsing.

use chrono::{DateTime, Utc};
use mail_parser::MessageParser;
use tracing::warn;

/// Unfolded headers in file order, names lowercased.
#[derive(Debug, Default, Clone)]
pub struct HeaderMap {
    entries: Vec<(String, String)>,
}

impl HeaderMap {
    /// Parse the header block of a message (everything before the first blank line).
    pub fn parse(text: &str) -> Self {
        let mut entries: Vec<(String, String)> = Vec::new();

        for line in text.lines() {
            if line.is_empty() {
                break;
            }
            if line.starts_with(' ') || line.starts_with('\t') {
                if let Some(last) = entries.last_mut() {
                    last.1.push(' ');
                    last.1.push_str(line.trim());
                }
            } else if let Some((name, value)) = line.split_once(':') {
                entries.push((name.trim().to_ascii_lowercase(), value.trim().to_string()));
            }
        }

        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// First raw value for `name`, matched case-insensitively.
    pub fn get(&self, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.entries
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }

    /// First value for `name` with encoded-words decoded. Blank values are `None`.
    pub fn get_text(&self, name: &str) -> Option<String> {
        self.get(name)
            .map(decode_text)
            .filter(|value| !value.trim().is_empty())
    }
}

/// Decode RFC 2047 encoded-words in an unstructured header value.
///
/// The value is wrapped in a one-header message so `mail-parser` does the
/// charset work. Undecodable input is returned unchanged.
pub fn decode_text(raw: &str) -> String {
    if !raw.contains("=?") {
        return raw.trim().to_string();
    }
    let wrapped = format!("Subject: {raw}\n\n");
    MessageParser::default()
        .parse(wrapped.as_bytes())
        .and_then(|msg| msg.subject().map(str::to_string))
        .unwrap_or_else(|| raw.trim().to_string())
}

/// Parse a `Date:` value. RFC 2822 first, then RFC 3339, then `mail-parser`.
pub fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    let wrapped = format!("Date: {trimmed}\n\n");
    let parsed = MessageParser::default()
        .parse(wrapped.as_bytes())
        .and_then(|msg| msg.date().map(|d| d.to_timestamp()))
        .and_then(|ts| DateTime::from_timestamp(ts, 0));
    if parsed.is_none() {
        warn!(date = trimmed, "Could not parse date");
    }
    parsed
}

/// Keep the `<…>` token of a Message-ID, adding brackets if missing.
pub fn normalize_message_id(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if let Some(start) = trimmed.find('<') {
        if let Some(end) = trimmed[start..].find('>') {
            let inner = &trimmed[start + 1..start + end];
            return (!inner.trim().is_empty()).then(|| format!("<{}>", inner.trim()));
        }
    }
    (!trimmed.is_empty()).then(|| format!("<{trimmed}>"))
}
