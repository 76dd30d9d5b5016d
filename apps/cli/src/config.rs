//! Optional JSON configuration file.
//!
//! Lives at `$XDG_CONFIG_HOME/gxupload/config.json` (`~/.config` when unset,
//! `%APPDATA%` on Windows). Every field is optional; command-line flags and
//! environment variables take precedence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const DEFAULT_URL: &str = "http://localhost:8080";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Galaxy base URL.
    pub url: Option<String>,
    /// Resume store used when `--storage` is not given.
    pub storage: Option<PathBuf>,
    pub chunk_size: Option<usize>,
    pub max_retries: Option<u32>,
}

impl CliConfig {
    /// Loads `path`, or the default location when `None`.
    ///
    /// A missing file yields the defaults; an unreadable or malformed one is
    /// logged and ignored.
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path.map(Path::to_path_buf).or_else(default_path) else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }

        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to read config, using defaults");
                return Self::default();
            }
        };
        match serde_json::from_str::<CliConfig>(&content) {
            Ok(config) => {
                tracing::debug!(path = %path.display(), "loaded config");
                config.validated(&path)
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to parse config, using defaults");
                Self::default()
            }
        }
    }

    /// Drops values the command line would have rejected.
    fn validated(mut self, path: &Path) -> Self {
        if self.chunk_size == Some(0) {
            tracing::warn!(path = %path.display(), "ignoring chunk_size 0, using the default");
            self.chunk_size = None;
        }
        self
    }

    /// Server URL: flag or env first, then the config file.
    pub fn url(&self, flag: Option<&str>) -> String {
        flag.map(str::to_string)
            .or_else(|| self.url.clone())
            .unwrap_or_else(|| DEFAULT_URL.to_string())
    }

    pub fn storage(&self, flag: Option<&Path>) -> Option<PathBuf> {
        flag.map(Path::to_path_buf).or_else(|| self.storage.clone())
    }
}

/// Default config file location, if a base directory is known.
pub fn default_path() -> Option<PathBuf> {
    config_base_dir().map(|d| d.join("gxupload").join("config.json"))
}

fn config_base_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(PathBuf::from)
    }

    #[cfg(not(target_os = "windows"))]
    {
        std::env::var_os("XDG_CONFIG_HOME")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))
    }
}
