// Static configuration loaded once at startup.
// Holds the plugin name, log limit, host defaults, and per-group setting overrides.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::cache::paths;
use crate::error::{FeedError, Result};

/// Default plugin name, used for CSS classes, the shortcode tag and the event name.
pub const DEFAULT_NAME: &str = "recright-feed";

/// Default number of log lines retained after rotation.
pub const DEFAULT_LOG_LIMIT: usize = 5;

/// Fallback date format when neither the setting nor the host provides one.
pub const FALLBACK_DATE_FORMAT: &str = "j.n.Y";

/// Top-level static configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Plugin name.
    pub name: String,
    /// Log lines kept after rotation; rotation kicks in above twice this.
    pub log_limit: usize,
    /// Override for the cache/data directory.
    pub data_dir: Option<PathBuf>,
    /// Host platform defaults.
    pub host: HostConfig,
    /// Overrides for the `general` settings defaults.
    pub general: Map<String, Value>,
    /// Overrides for the `advanced` settings defaults.
    pub advanced: Map<String, Value>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            log_limit: DEFAULT_LOG_LIMIT,
            data_dir: None,
            host: HostConfig::default(),
            general: Map::new(),
            advanced: Map::new(),
        }
    }
}

/// Defaults normally supplied by the host platform.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Site-wide date format (PHP `date()` letters).
    pub date_format: Option<String>,
    /// Site UTC offset such as `+02:00`.
    pub utc_offset: Option<String>,
}

impl HostConfig {
    /// Parse the configured UTC offset, falling back to UTC.
    pub fn offset(&self) -> FixedOffset {
        let utc = Utc.fix();
        match self.utc_offset.as_deref().map(str::trim) {
            None | Some("") => utc,
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                warn!("Ignoring invalid utc_offset {:?}", raw);
                utc
            }),
        }
    }
}

impl Config {
    /// Load from an explicit path, or the default location, or fall back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => Some(path.to_path_buf()),
            None => paths::config_path(),
        };

        match path {
            Some(path) if path.exists() => {
                info!("Loading config from: {}", path.display());
                Self::load_from_path(&path)
            }
            _ => {
                debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load a config file from disk.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents).map_err(|e| {
            FeedError::Settings(format!("failed to parse {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the rest of the crate cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(FeedError::Settings("name must not be empty".to_string()));
        }
        if self.log_limit == 0 {
            return Err(FeedError::Settings("log_limit must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Event name fired by the scheduler, e.g. `recright_feed_hook`.
    pub fn hook_name(&self) -> String {
        format!("{}_hook", self.name.replace('-', "_"))
    }

    /// Directory holding the cache file, logs and stored options.
    pub fn data_dir(&self) -> Option<PathBuf> {
        self.data_dir
            .clone()
            .or_else(|| paths::data_dir(&self.name))
    }
}
