//! Mutations: send (deliver into `new/`), move and organize.

use std::io;

use tracing::{info, warn};

use super::{validate_filename, MailboxService};
use crate::compose::eml::{encode, generate_message_id};
use crate::error::{GtdError, Result};
use crate::mailbox::message_path;
use crate::model::address::EmailAddress;
use crate::model::mailbox::{Folder, Mailbox};
use crate::model::message::{Attachment, Draft, GtdMetadata};
use crate::parser::filename::UniqueName;
use crate::workflow::Outcome;

/// Give up on unique names after this many collisions in one second.
const MAX_NAME_ATTEMPTS: u32 = 1000;

/// Status written on every newly sent message.
pub const NEW_STATUS: &str = "new";

/// Outcome of a move. Expected negatives (missing file, occupied target)
/// come back with `success = false` rather than as errors.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct MoveResult {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl MoveResult {
    fn done(message: String, source: String, target: Option<String>) -> Self {
        Self {
            success: true,
            message,
            source: Some(source),
            target,
        }
    }

    fn failed(message: String, source: Option<String>, target: Option<String>) -> Self {
        Self {
            success: false,
            message,
            source,
            target,
        }
    }
}

/// Input to [`MailboxService::send_message`].
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct SendRequest {
    pub from: String,
    /// Exactly one recipient mailbox address.
    pub to: String,
    pub subject: String,
    #[serde(alias = "body")]
    pub text: String,
    #[serde(default)]
    pub html: Option<String>,
    #[serde(default)]
    pub gtd: Option<GtdMetadata>,
    #[serde(skip)]
    pub attachments: Vec<Attachment>,
}

/// Where a sent message landed.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SentMessage {
    pub filename: String,
    pub path: String,
    pub message_id: String,
}

impl MailboxService {
    /// Encode and deliver a message into the recipient's `new/` folder.
    ///
    /// The file is written to `tmp/` first and renamed into `new/`.
    pub async fn send_message(&self, request: SendRequest) -> Result<SentMessage> {
        let from = EmailAddress::parse_list(&request.from);
        if from.is_empty() {
            return Err(GtdError::InvalidArgument("missing sender address".to_string()));
        }
        let to = EmailAddress::parse_list(&request.to);
        let recipient = match to.as_slice() {
            [one] => one.clone(),
            [] => return Err(GtdError::InvalidArgument("missing recipient address".to_string())),
            _ => {
                return Err(GtdError::InvalidArgument(
                    "send-message takes exactly one recipient".to_string(),
                ))
            }
        };
        let mailbox = self.resolve(&recipient.address).await?;

        let mut gtd = request.gtd.unwrap_or_default();
        gtd.status = Some(NEW_STATUS.to_string());
        let message_id = generate_message_id();
        let draft = Draft {
            from,
            to: vec![recipient],
            subject: request.subject,
            text: request.text,
            html: request.html,
            attachments: request.attachments,
            gtd,
            message_id: Some(message_id.clone()),
            date: None,
        };
        let wire = encode(&draft)?;

        let filename = self.free_filename(&mailbox).await?;
        let tmp_path = message_path(&mailbox, Folder::Tmp, &filename);
        let new_path = message_path(&mailbox, Folder::New, &filename);

        self.storage.write(&tmp_path, &wire).await?;
        if let Err(e) = self.storage.rename(&tmp_path, &new_path).await {
            if let Err(cleanup) = self.storage.remove(&tmp_path).await {
                warn!(path = %tmp_path, error = %cleanup, "Could not clean up tmp file");
            }
            return Err(e);
        }

        info!(to = %mailbox.address, file = %filename, "Delivered message");
        Ok(SentMessage {
            filename,
            path: new_path,
            message_id: format!("<{message_id}>"),
        })
    }

    /// Move a message out of `new/` or `cur/` into `target`.
    ///
    /// `tmp/` is delivery scratch space and never a move target.
    pub async fn move_to_folder(
        &self,
        address: &str,
        filename: &str,
        target: Folder,
    ) -> Result<MoveResult> {
        validate_filename(filename)?;
        if target == Folder::Tmp {
            return Err(GtdError::InvalidArgument(
                "tmp is reserved for delivery and cannot be a move target".to_string(),
            ));
        }
        let mailbox = self.resolve(address).await?;

        let Some(source_folder) = self.locate_staged(&mailbox, filename).await? else {
            return Ok(MoveResult::failed(
                format!("{filename} is not in new/ or cur/ of {address}"),
                None,
                None,
            ));
        };
        let source = message_path(&mailbox, source_folder, filename);
        let target_path = message_path(&mailbox, target, filename);
        if source_folder == target {
            return Ok(MoveResult::failed(
                format!("{filename} is already in {target}"),
                Some(source),
                Some(target_path),
            ));
        }

        match self.storage.rename(&source, &target_path).await {
            Ok(()) => {
                info!(mailbox = %address, file = filename, from = %source_folder, to = %target, "Moved message");
                Ok(MoveResult::done(
                    format!("Moved {filename} from {source_folder} to {target}"),
                    source,
                    Some(target_path),
                ))
            }
            Err(GtdError::Storage { source: ref err, .. })
                if err.kind() == io::ErrorKind::AlreadyExists =>
            {
                Ok(MoveResult::failed(
                    format!("{target} already holds {filename}"),
                    Some(source),
                    Some(target_path),
                ))
            }
            Err(e) if e.is_not_found() => Ok(MoveResult::failed(
                format!("{filename} disappeared before it could be moved"),
                Some(source),
                Some(target_path),
            )),
            Err(e) => Err(e),
        }
    }

    /// Apply a clarification outcome: move to its folder, or delete for trash.
    pub async fn organize_item(
        &self,
        address: &str,
        filename: &str,
        outcome: Outcome,
    ) -> Result<MoveResult> {
        if let Some(folder) = outcome.target_folder() {
            return self.move_to_folder(address, filename, folder).await;
        }

        validate_filename(filename)?;
        let mailbox = self.resolve(address).await?;
        let Some(folder) = self.locate_staged(&mailbox, filename).await? else {
            return Ok(MoveResult::failed(
                format!("{filename} is not in new/ or cur/ of {address}"),
                None,
                None,
            ));
        };
        let path = message_path(&mailbox, folder, filename);
        match self.storage.remove(&path).await {
            Ok(()) => {
                info!(mailbox = %address, file = filename, "Trashed message");
                Ok(MoveResult::done(format!("Deleted {filename}"), path, None))
            }
            Err(e) if e.is_not_found() => Ok(MoveResult::failed(
                format!("{filename} disappeared before it could be deleted"),
                Some(path),
                None,
            )),
            Err(e) => Err(e),
        }
    }

    /// Reference is the canonical "done" folder.
    pub async fn organize_to_reference(&self, address: &str, filename: &str) -> Result<MoveResult> {
        self.move_to_folder(address, filename, Folder::Reference).await
    }

    /// `new/` or `cur/`, whichever holds the file first.
    async fn locate_staged(&self, mailbox: &Mailbox, filename: &str) -> Result<Option<Folder>> {
        for folder in Folder::STAGING {
            if self
                .storage
                .exists(&message_path(mailbox, folder, filename))
                .await?
            {
                return Ok(Some(folder));
            }
        }
        Ok(None)
    }

    /// A name free in both `tmp/` and `new/`. Same-second collisions get a counter.
    async fn free_filename(&self, mailbox: &Mailbox) -> Result<String> {
        let unique = UniqueName::now(&self.host);
        for attempt in 0..MAX_NAME_ATTEMPTS {
            let name = if attempt == 0 {
                unique.filename("")
            } else {
                unique.with_sequence(attempt).filename("")
            };
            let taken = self
                .storage
                .exists(&message_path(mailbox, Folder::New, &name))
                .await?
                || self
                    .storage
                    .exists(&message_path(mailbox, Folder::Tmp, &name))
                    .await?;
            if !taken {
                return Ok(name);
            }
        }
        Err(GtdError::storage(
            mailbox.path.clone(),
            io::Error::new(io::ErrorKind::AlreadyExists, "no free message filename this second"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::parser::eml::decode;
    use crate::store::{MemoryStorage, Storage};

    const KEVIN: &str = "People/kevin@swoft.ai";

    async fn service() -> (Arc<MemoryStorage>, MailboxService) {
        let storage = Arc::new(MemoryStorage::new());
        storage.create_dir(&format!("{KEVIN}/new")).await;
        let service = MailboxService::new(storage.clone()).with_host("testhost");
        (storage, service)
    }

    fn request() -> SendRequest {
        SendRequest {
            from: "x@swoft.ai".to_string(),
            to: "kevin@swoft.ai".to_string(),
            subject: "Hi".to_string(),
            text: "Body".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_send_message_writes_into_new() {
        let (storage, service) = service().await;
        let sent = service.send_message(request()).await.unwrap();

        assert!(sent.path.starts_with("People/kevin@swoft.ai/new/"));
        assert!(sent.filename.ends_with(".testhost_2,.eml"));
        assert_eq!(storage.list(&format!("{KEVIN}/new")).await.unwrap(), vec![sent.filename.clone()]);
        assert!(storage.list(&format!("{KEVIN}/tmp")).await.unwrap().is_empty());

        let msg = decode(&storage.read(&sent.path).await.unwrap(), &sent.filename).unwrap();
        assert_eq!(msg.gtd.status.as_deref(), Some("new"));
        assert_eq!(msg.subject, "Hi");
        assert_eq!(msg.message_id, sent.message_id);
    }

    #[tokio::test]
    async fn test_send_message_forces_new_status() {
        let (storage, service) = service().await;
        let mut req = request();
        req.gtd = Some(GtdMetadata {
            status: Some("done".to_string()),
            project: Some("Ops".to_string()),
            ..Default::default()
        });
        let sent = service.send_message(req).await.unwrap();
        let msg = decode(&storage.read(&sent.path).await.unwrap(), &sent.filename).unwrap();
        assert_eq!(msg.gtd.status.as_deref(), Some("new"));
        assert_eq!(msg.gtd.project.as_deref(), Some("Ops"));
    }

    #[tokio::test]
    async fn test_send_message_same_second_does_not_collide() {
        let (storage, service) = service().await;
        let first = service.send_message(request()).await.unwrap();
        let second = service.send_message(request()).await.unwrap();
        assert_ne!(first.filename, second.filename);
        assert_eq!(storage.list(&format!("{KEVIN}/new")).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_send_message_unknown_recipient() {
        let (_, service) = service().await;
        let mut req = request();
        req.to = "nobody@swoft.ai".to_string();
        let err = service.send_message(req).await.unwrap_err();
        assert!(matches!(err, GtdError::MailboxNotFound(_)));
    }

    #[tokio::test]
    async fn test_move_to_folder() {
        let (storage, service) = service().await;
        storage
            .write(&format!("{KEVIN}/cur/1.1.h_2,S.eml"), "Subject: x\n\n")
            .await
            .unwrap();

        let result = service
            .move_to_folder("kevin@swoft.ai", "1.1.h_2,S.eml", Folder::Reference)
            .await
            .unwrap();
        assert!(result.success, "{}", result.message);
        assert_eq!(
            result.target.as_deref(),
            Some("People/kevin@swoft.ai/.Reference/1.1.h_2,S.eml")
        );
        assert!(!storage.exists(&format!("{KEVIN}/cur/1.1.h_2,S.eml")).await.unwrap());
    }

    #[tokio::test]
    async fn test_move_to_tmp_is_rejected() {
        let (storage, service) = service().await;
        storage.write(&format!("{KEVIN}/new/1.eml"), "Subject: a\n\n").await.unwrap();
        let err = service
            .move_to_folder("kevin@swoft.ai", "1.eml", Folder::Tmp)
            .await
            .unwrap_err();
        assert!(matches!(err, GtdError::InvalidArgument(_)));
        assert!(storage.exists(&format!("{KEVIN}/new/1.eml")).await.unwrap());
    }

    #[tokio::test]
    async fn test_move_missing_is_failure_result() {
        let (_, service) = service().await;
        let result = service
            .move_to_folder("kevin@swoft.ai", "ghost.eml", Folder::Reference)
            .await
            .unwrap();
        assert!(!result.success);
    }

    #[tokio::test]
    async fn test_move_does_not_overwrite() {
        let (storage, service) = service().await;
        storage.write(&format!("{KEVIN}/new/1.eml"), "Subject: a\n\n").await.unwrap();
        storage.write(&format!("{KEVIN}/.Projects/1.eml"), "Subject: b\n\n").await.unwrap();

        let result = service
            .move_to_folder("kevin@swoft.ai", "1.eml", Folder::Projects)
            .await
            .unwrap();
        assert!(!result.success);
        assert_eq!(
            storage.read(&format!("{KEVIN}/.Projects/1.eml")).await.unwrap(),
            "Subject: b\n\n"
        );
        assert!(storage.exists(&format!("{KEVIN}/new/1.eml")).await.unwrap());
    }

    #[tokio::test]
    async fn test_organize_item_trash_deletes() {
        let (storage, service) = service().await;
        storage.write(&format!("{KEVIN}/new/1.eml"), "Subject: spam\n\n").await.unwrap();
        let result = service
            .organize_item("kevin@swoft.ai", "1.eml", Outcome::Trash)
            .await
            .unwrap();
        assert!(result.success);
        assert!(!storage.exists(&format!("{KEVIN}/new/1.eml")).await.unwrap());
    }

    #[tokio::test]
    async fn test_organize_item_waiting_for() {
        let (storage, service) = service().await;
        storage.write(&format!("{KEVIN}/new/1.eml"), "Subject: quote\n\n").await.unwrap();
        let result = service
            .organize_item("kevin@swoft.ai", "1.eml", Outcome::WaitingFor)
            .await
            .unwrap();
        assert!(result.success);
        assert!(storage.exists(&format!("{KEVIN}/.Waiting-For/1.eml")).await.unwrap());
    }
}
