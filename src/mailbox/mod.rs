//! Mailbox directory model: address → workspace path, and folder paths.
//!
//! Mailboxes are the directories one level below `Organization/` and
//! `People/`. They are provisioned outside gtdmail and only discovered here.

use tracing::{debug, warn};

use crate::error::{GtdError, Result};
use crate::model::mailbox::{Category, Folder, Mailbox};
use crate::store::{join, Storage};

const CATEGORIES: [Category; 2] = [Category::Organization, Category::Person];

/// Result of [`list_mailboxes`]. A missing category directory is reported in
/// `diagnostics` instead of failing the listing.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct MailboxListing {
    pub mailboxes: Vec<Mailbox>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<String>,
}

/// Discover every mailbox under both category directories.
pub async fn list_mailboxes(storage: &dyn Storage) -> MailboxListing {
    let mut listing = MailboxListing::default();
    for category in CATEGORIES {
        match list_category(storage, category).await {
            Ok(found) => listing.mailboxes.extend(found),
            Err(e) => {
                warn!(
                    dir = category.parent_dir(),
                    error = %e,
                    "Mailbox category unavailable"
                );
                listing
                    .diagnostics
                    .push(format!("{}: {e}", category.parent_dir()));
            }
        }
    }
    listing
}

/// Resolve an address to its mailbox. The match is exact and case-sensitive.
pub async fn resolve(storage: &dyn Storage, address: &str) -> Result<Mailbox> {
    let address = address.trim();
    for category in CATEGORIES {
        let found = match list_category(storage, category).await {
            Ok(found) => found,
            Err(e) if e.is_not_found() => continue,
            Err(e) => return Err(e),
        };
        if let Some(mailbox) = found.into_iter().find(|m| m.address == address) {
            debug!(address, path = %mailbox.path, "Resolved mailbox");
            return Ok(mailbox);
        }
    }
    Err(GtdError::MailboxNotFound(address.to_string()))
}

/// Workspace-relative directory of `folder` inside `mailbox`.
pub fn folder_path(mailbox: &Mailbox, folder: Folder) -> String {
    join(&mailbox.path, &folder.dir_name())
}

/// Workspace-relative path of a message file.
pub fn message_path(mailbox: &Mailbox, folder: Folder, filename: &str) -> String {
    join(&folder_path(mailbox, folder), filename)
}

async fn list_category(storage: &dyn Storage, category: Category) -> Result<Vec<Mailbox>> {
    let entries = storage.list(category.parent_dir()).await?;
    Ok(entries
        .iter()
        .filter_map(|entry| entry.strip_suffix('/'))
        .filter(|name| !name.is_empty() && !name.starts_with('.'))
        .map(|name| Mailbox::new(name, category))
        .collect())
}
