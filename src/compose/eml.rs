//! Encoder for `.eml` work items.
//!
//! Messages are built with `mail-builder` and stored with `\n` line endings.

use std::borrow::Cow;

use chrono::Utc;
use mail_builder::headers::address::Address;
use mail_builder::headers::text::Text;
use mail_builder::MessageBuilder;
use tracing::debug;
use uuid::Uuid;

use crate::error::{GtdError, Result};
use crate::model::address::{EmailAddress, SENTINEL_DOMAIN};
use crate::model::message::Draft;
use crate::parser::eml::{
    HEADER_CONTEXT, HEADER_PRIORITY, HEADER_PROJECT, HEADER_STATUS, HEADER_TAGS,
};

/// Encode a draft as RFC 5322 text.
///
/// `X-GTD-*` headers are written only for fields that are set.
pub fn encode(draft: &Draft) -> Result<String> {
    if draft.from.is_empty() {
        return Err(GtdError::Encoding("message has no sender".to_string()));
    }
    if draft.to.is_empty() {
        return Err(GtdError::Encoding("message has no recipients".to_string()));
    }
    if let Some(bad) = draft
        .attachments
        .iter()
        .find(|a| a.filename.trim().is_empty() || a.content_type.trim().is_empty())
    {
        return Err(GtdError::Encoding(format!(
            "attachment is missing a filename or content type ({} bytes)",
            bad.content.len()
        )));
    }

    let message_id = draft
        .message_id
        .as_deref()
        .map(|id| id.trim().trim_start_matches('<').trim_end_matches('>').to_string())
        .filter(|id| !id.is_empty())
        .unwrap_or_else(generate_message_id);
    let date = draft.date.unwrap_or_else(Utc::now);

    let subject = normalize_newlines(&draft.subject).replace('\n', " ");

    let mut builder = MessageBuilder::new()
        .from(address_list(&draft.from))
        .to(address_list(&draft.to))
        .subject(subject.as_str())
        .message_id(message_id.as_str())
        .date(date.timestamp())
        .text_body(normalize_newlines(&draft.text));

    if let Some(html) = &draft.html {
        builder = builder.html_body(normalize_newlines(html));
    }

    let gtd = &draft.gtd;
    let fields = [
        (HEADER_PROJECT, gtd.project.clone()),
        (HEADER_CONTEXT, gtd.context.clone()),
        (HEADER_PRIORITY, gtd.priority.map(|p| p.as_str().to_string())),
        (HEADER_STATUS, gtd.status.clone()),
        (
            HEADER_TAGS,
            gtd.tags
                .as_ref()
                .filter(|tags| !tags.is_empty())
                .map(|tags| tags.join(", ")),
        ),
    ];
    for (name, value) in fields {
        if let Some(value) = value {
            builder = builder.header(name, Text::new(value));
        }
    }

    for attachment in &draft.attachments {
        builder = builder.attachment(
            attachment.content_type.as_str(),
            attachment.filename.as_str(),
            attachment.content.as_slice(),
        );
    }

    let bytes = builder
        .write_to_vec()
        .map_err(|e| GtdError::Encoding(e.to_string()))?;
    let text = String::from_utf8(bytes)
        .map_err(|e| GtdError::Encoding(format!("builder produced non UTF-8 output: {e}")))?;

    debug!(bytes = text.len(), "Encoded message");
    Ok(normalize_newlines(&text))
}

/// Message-ID body (without brackets) for outgoing messages.
pub fn generate_message_id() -> String {
    format!(
        "{}.{}@{SENTINEL_DOMAIN}",
        Utc::now().timestamp_millis(),
        Uuid::new_v4().simple()
    )
}

fn address_list(addresses: &[EmailAddress]) -> Address<'_> {
    let items = addresses
        .iter()
        .map(|addr| {
            Address::new_address(
                addr.name.as_deref().map(Cow::Borrowed),
                Cow::Borrowed(addr.address.as_str()),
            )
        })
        .collect();
    Address::new_list(items)
}

fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::message::{Attachment, GtdMetadata, Priority};
    use crate::parser::eml::decode;

    fn draft() -> Draft {
        Draft {
            from: vec![EmailAddress::with_name("x@swoft.ai", "Xavier")],
            to: vec![EmailAddress::new("kevin@swoft.ai")],
            subject: "Quarterly plan".to_string(),
            text: "Line one\r\nLine two\n".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_encode_round_trip_with_metadata() {
        let mut d = draft();
        d.subject = "Revisión del plan ✅".to_string();
        d.gtd = GtdMetadata {
            project: Some("Launch".to_string()),
            context: Some("@computer".to_string()),
            priority: Some(Priority::Medium),
            status: Some("new".to_string()),
            tags: Some(vec!["q3".to_string(), "planning".to_string()]),
        };

        let wire = encode(&d).unwrap();
        assert!(!wire.contains('\r'));
        assert!(wire.contains("X-GTD-Project: Launch"));
        assert!(wire.contains("X-GTD-Tags: q3, planning"));

        let msg = decode(&wire, "1700000000.1.h_2,.eml").unwrap();
        assert_eq!(msg.subject, d.subject);
        assert_eq!(msg.from, d.from);
        assert_eq!(msg.to, d.to);
        assert_eq!(msg.text.trim_end(), "Line one\nLine two");
        assert_eq!(msg.gtd, d.gtd);
        assert_eq!(msg.html, None);
    }

    #[test]
    fn test_encode_omits_absent_gtd_headers() {
        let wire = encode(&draft()).unwrap();
        assert!(!wire.to_ascii_lowercase().contains("x-gtd-"));
        let msg = decode(&wire, "x.eml").unwrap();
        assert_eq!(msg.gtd, GtdMetadata::default());
    }

    #[test]
    fn test_encode_keeps_given_message_id() {
        let mut d = draft();
        d.message_id = Some("<fixed.1@swoft.ai>".to_string());
        let msg = decode(&encode(&d).unwrap(), "x.eml").unwrap();
        assert_eq!(msg.message_id, "<fixed.1@swoft.ai>");
    }

    #[test]
    fn test_encode_html_and_attachment() {
        let mut d = draft();
        d.html = Some("<p>Hello</p>".to_string());
        d.attachments = vec![Attachment::new(
            "notes.pdf",
            "application/pdf",
            b"%PDF-1.4 notes".to_vec(),
        )];
        let msg = decode(&encode(&d).unwrap(), "x.eml").unwrap();
        assert!(msg.html.as_deref().unwrap_or_default().contains("Hello"));
        assert_eq!(msg.attachments.len(), 1);
        assert_eq!(msg.attachments[0].filename, "notes.pdf");
        assert_eq!(msg.attachments[0].content_type, "application/pdf");
        assert_eq!(msg.attachments[0].content, b"%PDF-1.4 notes");
    }

    #[test]
    fn test_encode_rejects_missing_recipients() {
        let mut d = draft();
        d.to.clear();
        assert_eq!(encode(&d).unwrap_err().kind(), "EncodingError");
    }

    #[test]
    fn test_encode_rejects_unnamed_attachment() {
        let mut d = draft();
        d.attachments = vec![Attachment::new("", "application/pdf", vec![1, 2, 3])];
        assert!(matches!(encode(&d), Err(GtdError::Encoding(_))));
    }
}
