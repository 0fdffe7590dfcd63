//! Decoder for `.eml` work items (RFC 5322 messages with `X-GTD-*` headers).
//!
//! Decoding is tolerant: a message with a header block always decodes, with
//! sentinels for a missing `Message-ID`, `From` or `To`.

use chrono::{DateTime, Utc};
use mail_parser::{MessageParser, MimeHeaders, PartType};
use uuid::Uuid;

use crate::error::{GtdError, Result};
use crate::model::address::{EmailAddress, SENTINEL_DOMAIN};
use crate::model::message::{Attachment, GtdMetadata, Message, Priority};
use crate::parser::filename::{parse_flags, EML_EXTENSION};
use crate::parser::header::{self, HeaderMap};

pub const HEADER_PROJECT: &str = "X-GTD-Project";
pub const HEADER_CONTEXT: &str = "X-GTD-Context";
pub const HEADER_PRIORITY: &str = "X-GTD-Priority";
pub const HEADER_STATUS: &str = "X-GTD-Status";
pub const HEADER_TAGS: &str = "X-GTD-Tags";

/// Decode `raw` as the message stored under `filename`.
///
/// Fails only when there is no header block at all.
pub fn decode(raw: &str, filename: &str) -> Result<Message> {
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let headers = HeaderMap::parse(raw);
    if headers.is_empty() {
        return Err(GtdError::Decoding {
            path: filename.to_string(),
            reason: "no RFC 5322 header block".to_string(),
        });
    }

    let message_id = headers
        .get("message-id")
        .and_then(header::normalize_message_id)
        .unwrap_or_else(synthesize_message_id);

    let date = headers
        .get("date")
        .and_then(header::parse_date)
        .or_else(|| timestamp_from_filename(filename))
        .unwrap_or(DateTime::UNIX_EPOCH);

    let mut message = Message {
        filename: filename.to_string(),
        folder: None,
        message_id,
        from: address_header(&headers, "from"),
        to: address_header(&headers, "to"),
        subject: headers.get_text("subject").unwrap_or_default(),
        date,
        text: String::new(),
        html: None,
        attachments: Vec::new(),
        flags: parse_flags(filename),
        gtd: gtd_metadata(&headers),
        size: Some(raw.len() as u64),
    };

    match MessageParser::default().parse(raw.as_bytes()) {
        Some(parsed) => {
            message.text = parsed
                .text_part(0)
                .and_then(|part| match &part.body {
                    PartType::Text(text) => Some(text.to_string()),
                    _ => None,
                })
                .or_else(|| parsed.body_text(0).map(|s| s.into_owned()))
                .map(|s| normalize_newlines(&s))
                .unwrap_or_default();
            message.html = parsed.html_part(0).and_then(|part| match &part.body {
                PartType::Html(html) => Some(normalize_newlines(html)),
                _ => None,
            });
            message.attachments = parsed
                .attachments()
                .enumerate()
                .map(|(idx, part)| {
                    let filename = part
                        .attachment_name()
                        .map(String::from)
                        .unwrap_or_else(|| format!("attachment_{idx}"));
                    let content_type = part
                        .content_type()
                        .map(|ct: &mail_parser::ContentType| match ct.subtype() {
                            Some(sub) => format!("{}/{sub}", ct.ctype()),
                            None => ct.ctype().to_string(),
                        })
                        .unwrap_or_else(|| "application/octet-stream".to_string());
                    Attachment::new(filename, content_type, part.contents().to_vec())
                })
                .collect();
        }
        None => {
            message.text = normalize_newlines(body_fallback(raw));
        }
    }

    Ok(message)
}

/// GTD metadata from `X-GTD-*` headers. Each field is `None` when its header is absent.
pub fn gtd_metadata(headers: &HeaderMap) -> GtdMetadata {
    let tags = headers.get_text(HEADER_TAGS).and_then(|value| {
        let tags: Vec<String> = value
            .split(',')
            .map(|tag| tag.trim().to_string())
            .filter(|tag| !tag.is_empty())
            .collect();
        (!tags.is_empty()).then_some(tags)
    });

    GtdMetadata {
        project: headers.get_text(HEADER_PROJECT),
        context: headers.get_text(HEADER_CONTEXT),
        priority: headers
            .get_text(HEADER_PRIORITY)
            .and_then(|p| Priority::parse(&p)),
        status: headers.get_text(HEADER_STATUS),
        tags,
    }
}

/// `<{timestamp}.{token}@swoft.ai>` for messages without a Message-ID.
pub fn synthesize_message_id() -> String {
    format!(
        "<{}.{}@{SENTINEL_DOMAIN}>",
        Utc::now().timestamp_millis(),
        Uuid::new_v4().simple()
    )
}

fn address_header(headers: &HeaderMap, name: &str) -> Vec<EmailAddress> {
    let mut list: Vec<EmailAddress> = headers
        .get(name)
        .map(EmailAddress::parse_list)
        .unwrap_or_default()
        .into_iter()
        .map(|mut addr| {
            addr.name = addr
                .name
                .map(|n| header::decode_text(&n))
                .filter(|n| !n.is_empty());
            addr
        })
        .collect();
    if list.is_empty() {
        list.push(EmailAddress::unknown());
    }
    list
}

/// Leading `{unixSeconds}.` of a Maildir name.
fn timestamp_from_filename(filename: &str) -> Option<DateTime<Utc>> {
    let stem = filename.strip_suffix(EML_EXTENSION).unwrap_or(filename);
    let (seconds, _) = stem.split_once('.')?;
    DateTime::from_timestamp(seconds.parse().ok()?, 0)
}

fn body_fallback(raw: &str) -> &str {
    raw.find("\r\n\r\n")
        .map(|pos| &raw[pos + 4..])
        .or_else(|| raw.find("\n\n").map(|pos| &raw[pos + 2..]))
        .unwrap_or("")
}

fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_minimal_message() {
        let raw = "Subject: Test\nFrom: a@b.com\n\nhello\n";
        let msg = decode(raw, "1700000000.123.host_2,.eml").unwrap();
        assert_eq!(msg.subject, "Test");
        assert_eq!(msg.from[0].address, "a@b.com");
        assert_eq!(msg.to, vec![EmailAddress::unknown()]);
        assert!(!msg.flags.seen);
        assert_eq!(msg.text.trim_end(), "hello");
        assert_eq!(msg.date.timestamp(), 1_700_000_000);
        assert!(msg.message_id.starts_with('<'));
        assert!(msg.message_id.ends_with("@swoft.ai>"));
    }

    #[test]
    fn test_decode_missing_from_uses_sentinel() {
        let msg = decode("Subject: x\n\nbody", "INBOX-1.eml").unwrap();
        assert_eq!(msg.from[0].address, "unknown@swoft.ai");
        assert_eq!(msg.date, DateTime::UNIX_EPOCH);
    }

    #[test]
    fn test_decode_gtd_headers_any_case() {
        let raw = "From: a@b.com\nx-gtd-project: Launch\nX-GTD-CONTEXT: @office\n\
                   X-Gtd-Priority: HIGH\nX-GTD-Status: new\nX-GTD-Tags: alpha , beta,,gamma \n\nbody\n";
        let msg = decode(raw, "1.1.h_2,S.eml").unwrap();
        assert_eq!(msg.gtd.project.as_deref(), Some("Launch"));
        assert_eq!(msg.gtd.context.as_deref(), Some("@office"));
        assert_eq!(msg.gtd.priority, Some(Priority::High));
        assert_eq!(msg.gtd.status.as_deref(), Some("new"));
        assert_eq!(
            msg.gtd.tags,
            Some(vec!["alpha".to_string(), "beta".to_string(), "gamma".to_string()])
        );
        assert!(msg.flags.seen);
    }

    #[test]
    fn test_decode_absent_gtd_headers() {
        let msg = decode("From: a@b.com\nX-GTD-Tags:\n\nbody", "x.eml").unwrap();
        assert_eq!(msg.gtd, GtdMetadata::default());
    }

    #[test]
    fn test_decode_keeps_message_id() {
        let msg = decode("Message-ID: <abc@example.com>\nFrom: a@b.com\n\nx", "x.eml").unwrap();
        assert_eq!(msg.message_id, "<abc@example.com>");
    }

    #[test]
    fn test_decode_rejects_headerless_input() {
        let err = decode("just some text without headers", "x.eml").unwrap_err();
        assert_eq!(err.kind(), "DecodingError");
    }

    #[test]
    fn test_body_fallback() {
        assert_eq!(body_fallback("A: b\n\nbody"), "body");
        assert_eq!(body_fallback("A: b\r\n\r\nbody"), "body");
        assert_eq!(body_fallback("A: b"), "");
    }
}
