//! Application configuration.
//!
//! Configuration is loaded from a TOML file at:
//! 1. `$GTDMAIL_CONFIG` (environment variable)
//! 2. `~/.config/gtdmail/config.toml` (Linux)
//!    `~/Library/Application Support/gtdmail/config.toml` (macOS)
//!    `%APPDATA%\gtdmail\config.toml` (Windows)
//! 3. Built-in defaults
//!
//! The workspace root can also come from `$GTDMAIL_ROOT` or `--root`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::service::{
    Limits, DEFAULT_FOLDER_LIMIT, DEFAULT_INBOX_LIMIT, DEFAULT_MAX_INBOX_MESSAGE_BYTES,
};

/// Environment variable overriding `workspace.root`.
pub const ROOT_ENV: &str = "GTDMAIL_ROOT";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub workspace: WorkspaceConfig,
    pub limits: LimitsConfig,
    pub general: GeneralConfig,
}

/// The synced workspace tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Directory holding `Organization/`, `People/` and `Team/`.
    pub root: Option<PathBuf>,
    /// Host component for generated filenames. Defaults to the machine name.
    pub host: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Inbox messages larger than this are not parsed.
    pub max_inbox_message_bytes: u64,
    pub inbox_limit: usize,
    pub folder_limit: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub log_level: String,
    /// Override cache directory for logs.
    pub cache_dir: Option<PathBuf>,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_inbox_message_bytes: DEFAULT_MAX_INBOX_MESSAGE_BYTES,
            inbox_limit: DEFAULT_INBOX_LIMIT,
            folder_limit: DEFAULT_FOLDER_LIMIT,
        }
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            cache_dir: None,
        }
    }
}

impl Config {
    pub fn limits(&self) -> Limits {
        Limits {
            max_inbox_message_bytes: self.limits.max_inbox_message_bytes,
            inbox_limit: self.limits.inbox_limit,
            folder_limit: self.limits.folder_limit,
        }
    }

    /// Effective workspace root: explicit override, then `$GTDMAIL_ROOT`, then the file.
    pub fn workspace_root(&self, cli_root: Option<PathBuf>) -> Option<PathBuf> {
        cli_root
            .or_else(|| std::env::var_os(ROOT_ENV).map(PathBuf::from))
            .or_else(|| self.workspace.root.clone())
    }
}

// ── Load / save ─────────────────────────────────────────────────

/// Load configuration, searching standard locations.
///
/// Returns the default configuration if no file is found or on parse error.
pub fn load_config() -> Config {
    if let Some(path) = config_file_path() {
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(contents) => match toml::from_str::<Config>(&contents) {
                    Ok(cfg) => {
                        tracing::info!(path = %path.display(), "Loaded config");
                        return cfg;
                    }
                    Err(e) => {
                        tracing::warn!(
                            path = %path.display(),
                            error = %e,
                            "Failed to parse config, using defaults"
                        );
                    }
                },
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Failed to read config file, using defaults"
                    );
                }
            }
        }
    }
    Config::default()
}

/// Save configuration to the standard location and return where it went.
pub fn save_config(config: &Config) -> anyhow::Result<PathBuf> {
    let path = config_file_path()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config file path"))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(&path, contents)?;
    tracing::info!(path = %path.display(), "Saved config");
    Ok(path)
}

/// Determine the config file path (checking env var first, then standard dirs).
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(env_path) = std::env::var("GTDMAIL_CONFIG") {
        return Some(PathBuf::from(env_path));
    }
    dirs::config_dir().map(|d| d.join("gtdmail").join("config.toml"))
}

/// Return the cache directory for logs.
pub fn cache_dir(config: &Config) -> PathBuf {
    if let Some(ref dir) = config.general.cache_dir {
        return dir.clone();
    }
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("gtdmail")
}
