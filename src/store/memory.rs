//! In-memory storage for tests and embedding.

use std::collections::{BTreeMap, BTreeSet};
use std::io;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::glob::Glob;
use super::{Stat, Storage};
use crate::error::{GtdError, Result};

#[derive(Debug, Default)]
struct Tree {
    files: BTreeMap<String, (String, DateTime<Utc>)>,
    dirs: BTreeSet<String>,
}

impl Tree {
    fn add_parents(&mut self, path: &str) {
        let mut current = path;
        while let Some((parent, _)) = current.rsplit_once('/') {
            self.dirs.insert(parent.to_string());
            current = parent;
        }
    }

    fn is_dir(&self, path: &str) -> bool {
        path.is_empty() || self.dirs.contains(path)
    }
}

/// [`Storage`] backed by a map of path → contents.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    tree: RwLock<Tree>,
}

fn not_found(path: &str) -> GtdError {
    GtdError::storage(path, io::Error::from(io::ErrorKind::NotFound))
}

fn normalize(path: &str) -> String {
    path.trim_matches('/').to_string()
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty directory (and its parents).
    pub async fn create_dir(&self, path: &str) {
        let path = normalize(path);
        let mut tree = self.tree.write().await;
        tree.add_parents(&path);
        tree.dirs.insert(path);
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn list(&self, path: &str) -> Result<Vec<String>> {
        let path = normalize(path);
        let tree = self.tree.read().await;
        if !tree.is_dir(&path) {
            return Err(not_found(&path));
        }
        let prefix = if path.is_empty() {
            String::new()
        } else {
            format!("{path}/")
        };

        let mut entries = BTreeSet::new();
        for dir in tree.dirs.iter().filter_map(|d| d.strip_prefix(&prefix)) {
            if !dir.is_empty() && !dir.contains('/') {
                entries.insert(format!("{dir}/"));
            }
        }
        for file in tree.files.keys().filter_map(|f| f.strip_prefix(&prefix)) {
            if !file.contains('/') {
                entries.insert(file.to_string());
            }
        }
        Ok(entries.into_iter().collect())
    }

    async fn read(&self, path: &str) -> Result<String> {
        let path = normalize(path);
        let tree = self.tree.read().await;
        tree.files
            .get(&path)
            .map(|(contents, _)| contents.clone())
            .ok_or_else(|| not_found(&path))
    }

    async fn write(&self, path: &str, contents: &str) -> Result<()> {
        let path = normalize(path);
        let mut tree = self.tree.write().await;
        tree.add_parents(&path);
        tree.files.insert(path, (contents.to_string(), Utc::now()));
        Ok(())
    }

    async fn stat(&self, path: &str) -> Result<Stat> {
        let path = normalize(path);
        let tree = self.tree.read().await;
        if let Some((contents, modified)) = tree.files.get(&path) {
            return Ok(Stat {
                size: contents.len() as u64,
                modified: Some(*modified),
                is_directory: false,
            });
        }
        if tree.is_dir(&path) {
            return Ok(Stat {
                size: 0,
                modified: None,
                is_directory: true,
            });
        }
        Err(not_found(&path))
    }

    async fn search(&self, pattern: &str, path: &str) -> Result<Vec<String>> {
        let glob = Glob::new(pattern)?;
        let base = normalize(path);
        let prefix = if base.is_empty() {
            String::new()
        } else {
            format!("{base}/")
        };
        let tree = self.tree.read().await;
        Ok(tree
            .files
            .keys()
            .filter(|f| {
                f.strip_prefix(&prefix)
                    .is_some_and(|relative| glob.is_match(relative))
            })
            .cloned()
            .collect())
    }

    async fn rename(&self, from: &str, to: &str) -> Result<()> {
        let (from, to) = (normalize(from), normalize(to));
        let mut tree = self.tree.write().await;
        if tree.files.contains_key(&to) {
            return Err(GtdError::storage(
                to,
                io::Error::new(io::ErrorKind::AlreadyExists, "target already exists"),
            ));
        }
        let (contents, _) = tree.files.remove(&from).ok_or_else(|| not_found(&from))?;
        tree.add_parents(&to);
        tree.files.insert(to, (contents, Utc::now()));
        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<()> {
        let path = normalize(path);
        let mut tree = self.tree.write().await;
        tree.files
            .remove(&path)
            .map(|_| ())
            .ok_or_else(|| not_found(&path))
    }
}
