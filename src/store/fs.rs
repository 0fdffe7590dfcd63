//! Local filesystem storage rooted at the synced workspace directory.

use std::io;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use super::glob::Glob;
use super::{join, Stat, Storage};
use crate::error::{GtdError, Result};

/// [`Storage`] over `tokio::fs`.
///
/// Every path is resolved under `root`; absolute paths and `..` are rejected.
#[derive(Debug, Clone)]
pub struct FsStorage {
    root: PathBuf,
}

impl FsStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        let escapes = relative.components().any(|c| {
            matches!(
                c,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });
        if escapes {
            return Err(GtdError::InvalidArgument(format!(
                "path '{path}' escapes the workspace root"
            )));
        }
        Ok(self.root.join(relative))
    }

    async fn walk(&self, base: &str, glob: &Glob, matches: &mut Vec<String>) -> Result<()> {
        let mut pending = vec![String::new()];
        while let Some(relative) = pending.pop() {
            let dir = join(base, &relative);
            for entry in self.list(&dir).await? {
                if let Some(name) = entry.strip_suffix('/') {
                    pending.push(join(&relative, name));
                } else {
                    let candidate = join(&relative, &entry);
                    if glob.is_match(&candidate) {
                        matches.push(join(base, &candidate));
                    }
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for FsStorage {
    async fn list(&self, path: &str) -> Result<Vec<String>> {
        let full = self.resolve(path)?;
        let mut reader = tokio::fs::read_dir(&full)
            .await
            .map_err(|e| GtdError::storage(path, e))?;

        let mut entries = Vec::new();
        while let Some(entry) = reader
            .next_entry()
            .await
            .map_err(|e| GtdError::storage(path, e))?
        {
            let name = entry.file_name().to_string_lossy().into_owned();
            let is_dir = entry
                .file_type()
                .await
                .map(|t| t.is_dir())
                .unwrap_or(false);
            entries.push(if is_dir { format!("{name}/") } else { name });
        }
        entries.sort();
        debug!(path, count = entries.len(), "Listed directory");
        Ok(entries)
    }

    async fn read(&self, path: &str) -> Result<String> {
        let full = self.resolve(path)?;
        let bytes = tokio::fs::read(&full)
            .await
            .map_err(|e| GtdError::storage(path, e))?;
        Ok(match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => {
                // Legacy 8-bit messages: every byte maps in Windows-1252.
                let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(e.as_bytes());
                decoded.into_owned()
            }
        })
    }

    async fn write(&self, path: &str, contents: &str) -> Result<()> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| GtdError::storage(path, e))?;
        }
        tokio::fs::write(&full, contents)
            .await
            .map_err(|e| GtdError::storage(path, e))?;
        debug!(path, bytes = contents.len(), "Wrote file");
        Ok(())
    }

    async fn stat(&self, path: &str) -> Result<Stat> {
        let full = self.resolve(path)?;
        let meta = tokio::fs::metadata(&full)
            .await
            .map_err(|e| GtdError::storage(path, e))?;
        Ok(Stat {
            size: meta.len(),
            modified: meta.modified().ok().map(DateTime::<Utc>::from),
            is_directory: meta.is_dir(),
        })
    }

    async fn search(&self, pattern: &str, path: &str) -> Result<Vec<String>> {
        let glob = Glob::new(pattern)?;
        let mut matches = Vec::new();
        self.walk(path, &glob, &mut matches).await?;
        matches.sort();
        Ok(matches)
    }

    async fn rename(&self, from: &str, to: &str) -> Result<()> {
        let source = self.resolve(from)?;
        let target = self.resolve(to)?;
        if tokio::fs::try_exists(&target)
            .await
            .map_err(|e| GtdError::storage(to, e))?
        {
            return Err(GtdError::storage(
                to,
                io::Error::new(io::ErrorKind::AlreadyExists, "target already exists"),
            ));
        }
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| GtdError::storage(to, e))?;
        }
        tokio::fs::rename(&source, &target)
            .await
            .map_err(|e| GtdError::storage(from, e))?;
        debug!(from, to, "Renamed file");
        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<()> {
        let full = self.resolve(path)?;
        tokio::fs::remove_file(&full)
            .await
            .map_err(|e| GtdError::storage(path, e))
    }
}
