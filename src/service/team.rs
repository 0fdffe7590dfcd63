//! Team inbox: file-based work items dropped for an owner.

use tracing::{debug, info, warn};

use super::MailboxService;
use crate::error::{GtdError, Result};
use crate::workflow::organize::team_inbox_dir;
use crate::workflow::{collect, organize, ArchiveInstruction, InboxItem};

impl MailboxService {
    /// Collect the work items in `Team/inbox-{owner}-claude`, with size and mtime.
    pub async fn collect_team_inbox(&self, owner: &str) -> Result<Vec<InboxItem>> {
        let dir = team_inbox_dir(owner.trim());
        let entries = self.storage.list(&dir).await?;
        let mut items = Vec::new();
        for mut item in collect(&dir, &entries) {
            match self.storage.stat(&item.path).await {
                Ok(stat) => {
                    item.size = Some(stat.size);
                    item.modified = stat.modified;
                    items.push(item);
                }
                Err(e) if e.is_not_found() => {
                    debug!(path = %item.path, "Team item vanished during collect");
                }
                Err(e) => {
                    warn!(path = %item.path, error = %e, "Could not stat team item");
                    items.push(item);
                }
            }
        }
        Ok(items)
    }

    /// Move a team inbox item into `processed/` and return the archive record.
    pub async fn archive_team_item(&self, owner: &str, item: &str) -> Result<ArchiveInstruction> {
        let plan = organize(item, owner)?;
        match self.storage.rename(&plan.source, &plan.target).await {
            Ok(()) => {
                info!(source = %plan.source, target = %plan.target, "Archived team item");
                Ok(plan)
            }
            Err(e) if e.is_not_found() => Err(GtdError::MessageNotFound {
                mailbox: team_inbox_dir(owner.trim()),
                filename: item.trim().to_string(),
            }),
            Err(e) => Err(e),
        }
    }
}
