// Bounded plain-text event logs.
// Appends timestamped lines and trims the oldest once the file grows past twice the limit.
//
// There is no file locking: a rotation racing an append from another process can
// drop the appended line.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::debug;

use crate::error::Result;

/// Timestamp prefix in the form `[YYYY-MM-DD HH:MM:SS] `.
pub fn timestamp_prefix() -> String {
    format!("[{}] ", Local::now().format("%Y-%m-%d %H:%M:%S"))
}

/// A log file retaining roughly the newest `limit` lines.
#[derive(Debug, Clone)]
pub struct LogFile {
    path: PathBuf,
    limit: usize,
}

impl LogFile {
    pub fn new(path: impl Into<PathBuf>, limit: usize) -> Self {
        Self {
            path: path.into(),
            limit,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Append one line. `prefix` defaults to the current timestamp.
    pub fn append(&self, line: &str, prefix: Option<&str>) -> Result<()> {
        if line.is_empty() {
            return Ok(());
        }

        let entry = match prefix {
            Some(prefix) => format!("{}{}", prefix, line),
            None => format!("{}{}", timestamp_prefix(), line),
        };
        self.write_entry(entry.trim())
    }

    /// Append several lines in one write, each with its own timestamp.
    pub fn append_lines<S: AsRef<str>>(&self, lines: &[S]) -> Result<()> {
        let entry = lines
            .iter()
            .map(AsRef::as_ref)
            .filter(|line| !line.is_empty())
            .map(|line| format!("{}{}", timestamp_prefix(), line))
            .collect::<Vec<_>>()
            .join("\n");

        if entry.is_empty() {
            return Ok(());
        }
        self.write_entry(entry.trim())
    }

    fn write_entry(&self, entry: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", entry)?;
        drop(file);

        let count = self.count_lines()?;
        if count > self.limit.saturating_mul(2) {
            debug!(
                "Rotating {} ({} lines, keeping {})",
                self.path.display(),
                count,
                self.limit
            );
            self.trim(count - self.limit)?;
        }
        Ok(())
    }

    /// Non-blank lines currently in the file.
    pub fn count_lines(&self) -> Result<usize> {
        Ok(self.read_lines()?.len())
    }

    /// Drop the first `skip` non-blank lines and rewrite the rest.
    pub fn trim(&self, skip: usize) -> Result<()> {
        let kept: Vec<String> = self.read_lines()?.into_iter().skip(skip).collect();
        let mut contents = kept.join("\n");
        contents.push('\n');
        fs::write(&self.path, contents)?;
        Ok(())
    }

    /// Up to `n` lines, newest first.
    pub fn recent(&self, n: usize) -> Result<Vec<String>> {
        let mut lines = self.read_lines()?;
        lines.reverse();
        lines.truncate(n);
        Ok(lines)
    }

    /// Empty the file if it exists.
    pub fn clear(&self) -> Result<()> {
        if self.path.is_file() {
            fs::write(&self.path, "")?;
        }
        Ok(())
    }

    fn read_lines(&self) -> Result<Vec<String>> {
        if !self.path.is_file() {
            return Ok(Vec::new());
        }
        let contents = fs::read_to_string(&self.path)?;
        Ok(contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }
}
