//! Batch and single-message reads.
//!
//! Batches are fail-soft per item: a vanished or undecodable file is logged
//! and skipped. Only a folder that cannot be listed fails the call.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::{is_message_entry, validate_filename, MailboxService};
use crate::error::{GtdError, Result};
use crate::mailbox::{folder_path, message_path};
use crate::model::address::EmailAddress;
use crate::model::mailbox::{Folder, Mailbox};
use crate::model::message::{GtdMetadata, Message, Priority};
use crate::parser::eml::{self, synthesize_message_id};
use crate::parser::filename::parse_flags;
use crate::store::Stat;
use crate::workflow::{clarify, Clarification, ClarifyDecision};

/// A message together with the clarification decision made about it.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ClarifiedItem {
    pub message: Message,
    #[serde(flatten)]
    pub decision: ClarifyDecision,
    /// Folder the outcome organizes into; `None` for trash.
    pub target_folder: Option<Folder>,
}

impl MailboxService {
    /// Newest messages in `new/`, with the size guard applied.
    pub async fn get_inbox(&self, address: &str, limit: Option<usize>) -> Result<Vec<Message>> {
        let mailbox = self.resolve(address).await?;
        let limit = limit.unwrap_or(self.limits.inbox_limit);
        let guard = Some(self.limits.max_inbox_message_bytes);
        self.load_folder(&mailbox, Folder::New, limit, guard).await
    }

    /// Newest messages in any folder. No size guard.
    pub async fn get_folder(
        &self,
        address: &str,
        folder: Folder,
        limit: Option<usize>,
    ) -> Result<Vec<Message>> {
        let mailbox = self.resolve(address).await?;
        let limit = limit.unwrap_or(self.limits.folder_limit);
        self.load_folder(&mailbox, folder, limit, None).await
    }

    /// Probe folders in [`Folder::READ_ORDER`] and return the first hit.
    ///
    /// `Ok(None)` means no folder holds the file.
    pub async fn read_message(&self, address: &str, filename: &str) -> Result<Option<Message>> {
        validate_filename(filename)?;
        let mailbox = self.resolve(address).await?;

        for folder in Folder::READ_ORDER {
            let path = message_path(&mailbox, folder, filename);
            let raw = match self.storage.read(&path).await {
                Ok(raw) => raw,
                Err(e) if e.is_not_found() => continue,
                Err(e) => {
                    warn!(path = %path, error = %e, "Unreadable candidate, trying next folder");
                    continue;
                }
            };
            match eml::decode(&raw, filename) {
                Ok(mut message) => {
                    message.folder = Some(folder);
                    return Ok(Some(message));
                }
                Err(e) => warn!(path = %path, error = %e, "Undecodable candidate, trying next folder"),
            }
        }

        debug!(address, filename, "Message not found in any folder");
        Ok(None)
    }

    /// Read a message and record a clarification about it. Nothing is moved.
    pub async fn clarify_item(
        &self,
        address: &str,
        filename: &str,
        clarification: Clarification,
    ) -> Result<ClarifiedItem> {
        let message = self.read_message(address, filename).await?.ok_or_else(|| {
            GtdError::MessageNotFound {
                mailbox: address.to_string(),
                filename: filename.to_string(),
            }
        })?;
        let target_folder = clarification.outcome.target_folder();
        Ok(ClarifiedItem {
            message,
            decision: clarify(clarification),
            target_folder,
        })
    }

    async fn load_folder(
        &self,
        mailbox: &Mailbox,
        folder: Folder,
        limit: usize,
        size_guard: Option<u64>,
    ) -> Result<Vec<Message>> {
        let dir = folder_path(mailbox, folder);
        let mut names: Vec<String> = self
            .storage
            .list(&dir)
            .await?
            .into_iter()
            .filter(|entry| is_message_entry(entry))
            .collect();
        // Names start with the delivery timestamp.
        names.sort_by(|a, b| b.cmp(a));

        let mut messages = Vec::with_capacity(limit.min(names.len()));
        for name in names.into_iter().take(limit) {
            match self.load_one(mailbox, folder, &name, size_guard).await {
                Ok(message) => messages.push(message),
                Err(e) if e.is_not_found() => {
                    warn!(folder = %dir, file = %name, "Message vanished during listing");
                }
                Err(e) => warn!(folder = %dir, file = %name, error = %e, "Skipping message"),
            }
        }
        debug!(folder = %dir, count = messages.len(), "Loaded folder");
        Ok(messages)
    }

    async fn load_one(
        &self,
        mailbox: &Mailbox,
        folder: Folder,
        name: &str,
        size_guard: Option<u64>,
    ) -> Result<Message> {
        let path = message_path(mailbox, folder, name);
        if let Some(limit) = size_guard {
            let stat = self.storage.stat(&path).await?;
            if stat.size > limit {
                warn!(path = %path, size = stat.size, limit, "Message over size guard, not parsed");
                return Ok(oversized_placeholder(mailbox, folder, name, &stat, limit));
            }
        }

        let raw = self.storage.read(&path).await?;
        let mut message = eml::decode(&raw, name).map_err(|e| match e {
            GtdError::Decoding { reason, .. } => GtdError::Decoding {
                path: path.clone(),
                reason,
            },
            other => other,
        })?;
        message.folder = Some(folder);
        Ok(message)
    }
}

/// Stand-in for a message the size guard refused to parse.
fn oversized_placeholder(
    mailbox: &Mailbox,
    folder: Folder,
    name: &str,
    stat: &Stat,
    limit: u64,
) -> Message {
    let mut flags = parse_flags(name);
    flags.flagged = true;
    let date: DateTime<Utc> = stat.modified.unwrap_or_else(Utc::now);
    let megabytes = stat.size as f64 / (1024.0 * 1024.0);

    Message {
        filename: name.to_string(),
        folder: Some(folder),
        message_id: synthesize_message_id(),
        from: vec![EmailAddress::unknown()],
        to: vec![EmailAddress::new(mailbox.address.clone())],
        subject: format!("⚠️ File too large: {name} ({megabytes:.1} MB)"),
        date,
        text: GtdError::Oversized {
            path: message_path(mailbox, folder, name),
            size: stat.size,
            limit,
        }
        .to_string(),
        html: None,
        attachments: Vec::new(),
        flags,
        gtd: GtdMetadata {
            priority: Some(Priority::High),
            ..Default::default()
        },
        size: Some(stat.size),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::service::Limits;
    use crate::store::{MemoryStorage, Storage};
    use crate::workflow::Outcome;

    const KEVIN: &str = "People/kevin@swoft.ai";

    async fn service_with(files: &[(&str, &str)]) -> MailboxService {
        let storage = Arc::new(MemoryStorage::new());
        storage.create_dir(&format!("{KEVIN}/new")).await;
        for (path, contents) in files {
            storage.write(&format!("{KEVIN}/{path}"), contents).await.unwrap();
        }
        MailboxService::new(storage)
    }

    #[tokio::test]
    async fn test_get_inbox_single_message() {
        let service = service_with(&[(
            "new/1700000000.123.host_2,.eml",
            "Subject: Test\nFrom: a@b.com\n\nhello\n",
        )])
        .await;
        let inbox = service.get_inbox("kevin@swoft.ai", Some(10)).await.unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].subject, "Test");
        assert!(!inbox[0].flags.seen);
        assert_eq!(inbox[0].folder, Some(Folder::New));
    }

    #[tokio::test]
    async fn test_get_inbox_newest_first_with_limit() {
        let service = service_with(&[
            ("new/1700000001.1.h_2,.eml", "Subject: one\n\n"),
            ("new/1700000002.1.h_2,.eml", "Subject: two\n\n"),
            ("new/1700000003.1.h_2,.eml", "Subject: three\n\n"),
        ])
        .await;
        let inbox = service.get_inbox("kevin@swoft.ai", Some(2)).await.unwrap();
        let subjects: Vec<&str> = inbox.iter().map(|m| m.subject.as_str()).collect();
        assert_eq!(subjects, vec!["three", "two"]);
    }

    #[tokio::test]
    async fn test_get_inbox_size_guard_placeholder() {
        let service = service_with(&[
            ("new/1700000001.1.h_2,.eml", "Subject: small\n\nok"),
            ("new/1700000002.1.h_2,S.eml", "Subject: big\n\n0123456789"),
        ])
        .await
        .with_limits(Limits {
            max_inbox_message_bytes: 20,
            ..Limits::default()
        });

        let inbox = service.get_inbox("kevin@swoft.ai", None).await.unwrap();
        assert_eq!(inbox.len(), 2);
        let big = &inbox[0];
        assert!(big.subject.starts_with("⚠️ File too large: "));
        assert!(big.flags.flagged);
        assert!(big.flags.seen);
        assert_eq!(big.gtd.priority, Some(Priority::High));
        assert_eq!(inbox[1].subject, "small");
    }

    #[tokio::test]
    async fn test_get_inbox_skips_undecodable() {
        let service = service_with(&[
            ("new/1700000001.1.h_2,.eml", "Subject: good\n\n"),
            ("new/1700000002.1.h_2,.eml", "no headers at all"),
        ])
        .await;
        let inbox = service.get_inbox("kevin@swoft.ai", None).await.unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].subject, "good");
    }

    #[tokio::test]
    async fn test_get_folder_missing_dir_fails_loud() {
        let service = service_with(&[]).await;
        let err = service
            .get_folder("kevin@swoft.ai", Folder::Projects, None)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_get_folder_has_no_size_guard() {
        let service = service_with(&[(".Reference/1700000001.1.h_2,.eml", "Subject: ref\n\nlong body")])
            .await
            .with_limits(Limits {
                max_inbox_message_bytes: 1,
                ..Limits::default()
            });
        let items = service
            .get_folder("kevin@swoft.ai", Folder::Reference, None)
            .await
            .unwrap();
        assert_eq!(items[0].subject, "ref");
    }

    #[tokio::test]
    async fn test_read_message_probe_order() {
        let service = service_with(&[
            (".Reference/1.1.h_2,.eml", "Subject: from reference\n\n"),
            ("cur/1.1.h_2,.eml", "Subject: from cur\n\n"),
        ])
        .await;
        let msg = service
            .read_message("kevin@swoft.ai", "1.1.h_2,.eml")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(msg.subject, "from cur");
        assert_eq!(msg.folder, Some(Folder::Cur));
    }

    #[tokio::test]
    async fn test_read_message_missing_is_none() {
        let service = service_with(&[]).await;
        let found = service
            .read_message("kevin@swoft.ai", "nowhere.eml")
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_read_message_unknown_mailbox_propagates() {
        let service = service_with(&[]).await;
        let err = service.read_message("ghost@swoft.ai", "x.eml").await.unwrap_err();
        assert!(matches!(err, GtdError::MailboxNotFound(_)));
    }

    #[tokio::test]
    async fn test_clarify_item() {
        let service = service_with(&[("new/1.1.h_2,.eml", "Subject: crash report\n\n")]).await;
        let item = service
            .clarify_item(
                "kevin@swoft.ai",
                "1.1.h_2,.eml",
                Clarification {
                    what_is_it: "bug".to_string(),
                    is_actionable: true,
                    outcome: Outcome::NextAction,
                },
            )
            .await
            .unwrap();
        assert_eq!(item.message.subject, "crash report");
        assert_eq!(item.target_folder, Some(Folder::NextActions));
        assert!(item.decision.recommended_action.contains("Next Actions"));
        // clarify does not move the file
        assert!(service
            .storage()
            .exists(&format!("{KEVIN}/new/1.1.h_2,.eml"))
            .await
            .unwrap());
    }
}
