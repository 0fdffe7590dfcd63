//! Mailbox query/mutation surface.
//!
//! [`MailboxService`] resolves mailboxes through the directory model, does
//! byte I/O through the injected [`Storage`], and uses the codec and the
//! workflow engine for everything in between.

mod read;
mod team;
mod write;

use std::sync::Arc;

use crate::error::{GtdError, Result};
use crate::mailbox::{self, MailboxListing};
use crate::model::mailbox::Mailbox;
use crate::parser::filename::local_hostname;
use crate::store::Storage;

pub use read::ClarifiedItem;
pub use write::{MoveResult, SendRequest, SentMessage};

/// Messages above this size in `new/` are replaced by a placeholder.
pub const DEFAULT_MAX_INBOX_MESSAGE_BYTES: u64 = 5 * 1024 * 1024;
pub const DEFAULT_INBOX_LIMIT: usize = 10;
pub const DEFAULT_FOLDER_LIMIT: usize = 50;

/// Batch sizes and the inbox size guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_inbox_message_bytes: u64,
    pub inbox_limit: usize,
    pub folder_limit: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_inbox_message_bytes: DEFAULT_MAX_INBOX_MESSAGE_BYTES,
            inbox_limit: DEFAULT_INBOX_LIMIT,
            folder_limit: DEFAULT_FOLDER_LIMIT,
        }
    }
}

/// GTD operations over one workspace.
#[derive(Clone)]
pub struct MailboxService {
    storage: Arc<dyn Storage>,
    limits: Limits,
    host: String,
}

impl MailboxService {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            limits: Limits::default(),
            host: local_hostname(),
        }
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Host component used in generated filenames.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    pub fn storage(&self) -> &dyn Storage {
        self.storage.as_ref()
    }

    pub async fn list_mailboxes(&self) -> MailboxListing {
        mailbox::list_mailboxes(self.storage()).await
    }

    pub async fn resolve(&self, address: &str) -> Result<Mailbox> {
        mailbox::resolve(self.storage(), address).await
    }

    /// Glob search inside one mailbox; results are workspace-relative paths.
    pub async fn search_mailbox(&self, address: &str, pattern: &str) -> Result<Vec<String>> {
        let mailbox = self.resolve(address).await?;
        self.storage.search(pattern, &mailbox.path).await
    }
}

/// Reject names that would leave the folder they are looked up in.
fn validate_filename(filename: &str) -> Result<()> {
    if filename.is_empty()
        || filename.contains('/')
        || filename.contains('\\')
        || filename == "."
        || filename == ".."
    {
        return Err(GtdError::InvalidArgument(format!(
            "'{filename}' is not a plain message filename"
        )));
    }
    Ok(())
}

/// Regular, visible files only.
fn is_message_entry(entry: &str) -> bool {
    !entry.ends_with('/') && !entry.starts_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStorage;

    #[test]
    fn test_validate_filename() {
        assert!(validate_filename("1700000000.1.h_2,.eml").is_ok());
        assert!(validate_filename("../x.eml").is_err());
        assert!(validate_filename("").is_err());
        assert!(validate_filename("..").is_err());
    }

    #[test]
    fn test_is_message_entry() {
        assert!(is_message_entry("1.eml"));
        assert!(!is_message_entry("sub/"));
        assert!(!is_message_entry(".DS_Store"));
    }

    #[tokio::test]
    async fn test_search_mailbox() {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .write("People/kevin@swoft.ai/.Reference/1.eml", "x")
            .await
            .unwrap();
        storage
            .write("People/kevin@swoft.ai/new/2.eml", "x")
            .await
            .unwrap();
        let service = MailboxService::new(storage);

        let found = service
            .search_mailbox("kevin@swoft.ai", ".Reference/*.eml")
            .await
            .unwrap();
        assert_eq!(found, vec!["People/kevin@swoft.ai/.Reference/1.eml"]);
    }
}
