//! Storage seam: workspace-relative file operations on the cloud-synced tree.
//!
//! Paths use `/` separators and are relative to the workspace root. Directory
//! entries returned by [`Storage::list`] end with `/`.

pub mod fs;
pub mod glob;
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;

pub use fs::FsStorage;
pub use memory::MemoryStorage;

/// Result of [`Storage::stat`].
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Stat {
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
    pub is_directory: bool,
}

/// File operations the core needs from the sync provider.
///
/// Errors for missing paths carry `io::ErrorKind::NotFound` so callers can
/// use [`GtdError::is_not_found`](crate::error::GtdError::is_not_found).
#[async_trait]
pub trait Storage: Send + Sync {
    /// Entry names directly under `path`; directories end with `/`.
    async fn list(&self, path: &str) -> Result<Vec<String>>;

    async fn read(&self, path: &str) -> Result<String>;

    /// Create or replace a file, creating parent directories.
    async fn write(&self, path: &str, contents: &str) -> Result<()>;

    async fn stat(&self, path: &str) -> Result<Stat>;

    /// Paths under `path` (relative to the workspace root) matching `pattern`.
    async fn search(&self, pattern: &str, path: &str) -> Result<Vec<String>>;

    /// Move a file. Fails with `AlreadyExists` when `to` is present.
    async fn rename(&self, from: &str, to: &str) -> Result<()>;

    async fn remove(&self, path: &str) -> Result<()>;

    /// `stat` that maps not-found to `false`.
    async fn exists(&self, path: &str) -> Result<bool> {
        match self.stat(path).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// Join workspace-relative path segments with `/`.
pub fn join(base: &str, name: &str) -> String {
    let base = base.trim_end_matches('/');
    let name = name.trim_start_matches('/');
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{base}/{name}")
    }
}
