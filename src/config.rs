// ABOUTME: Run configuration for a mirror pass
// ABOUTME: Merges CLI flags, an optional TOML file and built-in defaults, then validates

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::MirrorError;

pub const DEFAULT_SERVER: &str = "cloud.seafile.com";
pub const DEFAULT_SAVE_DIR: &str = ".";
pub const DEFAULT_SLEEP_SECS: u64 = 3;
pub const DEFAULT_WAIT_SECS: u64 = 300;

/// What to do when creating a ZIP task or downloading an archive fails for
/// one directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop the whole run.
    #[default]
    Abort,
    /// Log the failure and continue with the next directory.
    Skip,
}

/// One source of settings. Unset fields fall through to the next layer.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigLayer {
    pub server: Option<String>,
    pub save_dir: Option<PathBuf>,
    pub sleep_time: Option<u64>,
    pub wait_time: Option<u64>,
    pub remove_unknown: Option<bool>,
    pub on_error: Option<FailurePolicy>,
}

impl ConfigLayer {
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&data)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn from_toml_str(data: &str) -> Result<Self> {
        let layer: ConfigLayer = toml::from_str(data)?;
        Ok(layer)
    }

    /// Fills every unset field of `self` from `fallback`.
    pub fn or(self, fallback: ConfigLayer) -> ConfigLayer {
        ConfigLayer {
            server: self.server.or(fallback.server),
            save_dir: self.save_dir.or(fallback.save_dir),
            sleep_time: self.sleep_time.or(fallback.sleep_time),
            wait_time: self.wait_time.or(fallback.wait_time),
            remove_unknown: self.remove_unknown.or(fallback.remove_unknown),
            on_error: self.on_error.or(fallback.on_error),
        }
    }
}

#[derive(Clone)]
pub struct MirrorConfig {
    pub server: String,
    pub auth_token: String,
    pub repo_id: String,
    pub save_dir: PathBuf,
    pub sleep_interval: Duration,
    pub max_wait: Duration,
    pub remove_unknown: bool,
    pub on_error: FailurePolicy,
}

impl MirrorConfig {
    pub fn build(auth_token: String, repo_id: String, layer: ConfigLayer) -> Result<Self> {
        if auth_token.trim().is_empty() {
            return Err(MirrorError::Config("auth token must not be empty".to_string()).into());
        }
        if repo_id.trim().is_empty() {
            return Err(MirrorError::Config("repository ID must not be empty".to_string()).into());
        }

        let sleep_time = layer.sleep_time.unwrap_or(DEFAULT_SLEEP_SECS);
        if sleep_time == 0 {
            return Err(
                MirrorError::Config("sleep_time must be greater than zero".to_string()).into(),
            );
        }

        Ok(Self {
            server: layer.server.unwrap_or_else(|| DEFAULT_SERVER.to_string()),
            auth_token,
            repo_id,
            save_dir: layer
                .save_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SAVE_DIR)),
            sleep_interval: Duration::from_secs(sleep_time),
            max_wait: Duration::from_secs(layer.wait_time.unwrap_or(DEFAULT_WAIT_SECS)),
            remove_unknown: layer.remove_unknown.unwrap_or(false),
            on_error: layer.on_error.unwrap_or_default(),
        })
    }
}

// Hand-written so the auth token never reaches a log line.
impl fmt::Debug for MirrorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MirrorConfig")
            .field("server", &self.server)
            .field("auth_token", &"<redacted>")
            .field("repo_id", &self.repo_id)
            .field("save_dir", &self.save_dir)
            .field("sleep_interval", &self.sleep_interval)
            .field("max_wait", &self.max_wait)
            .field("remove_unknown", &self.remove_unknown)
            .field("on_error", &self.on_error)
            .finish()
    }
}
