// Cache path utilities.
// Resolves the data directory and the files kept inside it.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;

/// Cached feed file name.
pub const FEED_FILE: &str = "data.json";
/// Feed update log file name.
pub const FEED_LOG: &str = "feed.log";
/// Error log file name.
pub const ERROR_LOG: &str = "error.log";
/// Stored settings file name.
pub const OPTIONS_FILE: &str = "options.json";

/// Default data directory for a plugin name (~/.local/share/<name> on Linux).
pub fn data_dir(name: &str) -> Option<PathBuf> {
    ProjectDirs::from("", "", name).map(|dirs| dirs.data_dir().to_path_buf())
}

/// Default static config file (~/.config/jobfeed/config.json on Linux).
pub fn config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "jobfeed").map(|dirs| dirs.config_dir().join("config.json"))
}

/// Which log file an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogKind {
    Feed,
    Error,
}

impl LogKind {
    pub fn file_name(&self) -> &'static str {
        match self {
            LogKind::Feed => FEED_LOG,
            LogKind::Error => ERROR_LOG,
        }
    }
}

impl std::str::FromStr for LogKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "feed" => Ok(LogKind::Feed),
            "error" => Ok(LogKind::Error),
            other => Err(format!("unknown log kind: {}", other)),
        }
    }
}

/// Files managed under one data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePaths {
    dir: PathBuf,
}

impl CachePaths {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The data directory itself.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path to the cached feed JSON.
    pub fn feed_file(&self) -> PathBuf {
        self.dir.join(FEED_FILE)
    }

    /// Path to a log file.
    pub fn log(&self, kind: LogKind) -> PathBuf {
        self.dir.join(kind.file_name())
    }

    /// Path to the stored settings.
    pub fn options_file(&self) -> PathBuf {
        self.dir.join(OPTIONS_FILE)
    }

    /// Every file removed on deactivation.
    pub fn owned_files(&self) -> [PathBuf; 3] {
        [
            self.feed_file(),
            self.log(LogKind::Error),
            self.log(LogKind::Feed),
        ]
    }
}
