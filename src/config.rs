//! Run configuration.
//!
//! Built-in defaults, optionally overlaid by a JSON file (`--config PATH` or
//! `config.json` in the platform config dir), then by command-line flags.

use crate::error::{ProbeError, Result};
use crate::fetch::BrowserProfile;
use crate::types::HeaderSet;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_BROWSER_BINARY: &str = "chromium";
pub const DEFAULT_BROWSER_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_ACCEPT: &str = "application/json";
pub const DEFAULT_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Where saved results go.
    pub data_dir: PathBuf,
    /// Upper bound for any single strategy. `None` waits forever.
    pub strategy_timeout_secs: Option<u64>,
    pub browser_timeout_secs: u64,
    pub browser_binary: PathBuf,
    /// Browser presented by the `cloudflare-headers` and `tls-profile` strategies.
    pub browser_profile: BrowserProfile,
    pub accept: String,
    pub accept_language: String,
    /// Append every result to the activity log.
    pub history: bool,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            strategy_timeout_secs: None,
            browser_timeout_secs: DEFAULT_BROWSER_TIMEOUT_SECS,
            browser_binary: PathBuf::from(DEFAULT_BROWSER_BINARY),
            browser_profile: BrowserProfile::default(),
            accept: DEFAULT_ACCEPT.to_string(),
            accept_language: DEFAULT_ACCEPT_LANGUAGE.to_string(),
            history: true,
        }
    }
}

impl ProbeConfig {
    /// `config.json` under the platform config dir, if one can be resolved.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("io", "scrapeprobe", "scrapeprobe")
            .map(|proj| proj.config_dir().join("config.json"))
    }

    /// Load from an explicit path (must exist) or from the default path
    /// (skipped when absent).
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "loading config");
        let text = fs::read_to_string(path)
            .map_err(|e| ProbeError::Config(format!("cannot read {}: {e}", path.display())))?;
        serde_json::from_str(&text)
            .map_err(|e| ProbeError::Config(format!("invalid config {}: {e}", path.display())))
    }

    pub fn strategy_timeout(&self) -> Option<Duration> {
        self.strategy_timeout_secs.map(Duration::from_secs)
    }

    pub fn browser_timeout(&self) -> Duration {
        Duration::from_secs(self.browser_timeout_secs)
    }

    /// The header set every strategy receives.
    pub fn request_headers(&self, user_agent: &str) -> HeaderSet {
        HeaderSet::empty()
            .with("User-Agent", user_agent)
            .with("Accept", &self.accept)
            .with("Accept-Language", &self.accept_language)
    }
}
