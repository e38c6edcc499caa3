// Feed cache pipeline.
// Fetches the remote feed, replaces the cache file, and records outcomes in the feed and error logs.

use tracing::{info, warn};

use crate::cache::{CachePaths, LogFile, LogKind, store};
use crate::error::{FeedError, Result};

use super::client::FeedClient;
use super::types::FeedRecord;

/// Message written to the feed log after a successful update.
pub const UPDATED_MESSAGE: &str = "Feed cache updated";

/// Fetches the feed into the cache file and reads it back.
#[derive(Debug, Clone)]
pub struct FeedCache {
    client: FeedClient,
    paths: CachePaths,
    feed_log: LogFile,
    error_log: LogFile,
}

impl FeedCache {
    pub fn new(client: FeedClient, paths: CachePaths, log_limit: usize) -> Self {
        let feed_log = LogFile::new(paths.log(LogKind::Feed), log_limit);
        let error_log = LogFile::new(paths.log(LogKind::Error), log_limit);
        Self {
            client,
            paths,
            feed_log,
            error_log,
        }
    }

    pub fn paths(&self) -> &CachePaths {
        &self.paths
    }

    /// The log file of the given kind.
    pub fn log(&self, kind: LogKind) -> &LogFile {
        match kind {
            LogKind::Feed => &self.feed_log,
            LogKind::Error => &self.error_log,
        }
    }

    /// Fetch `feed_url` and replace the cache file.
    ///
    /// `suffix` annotates the feed log entry (e.g. "via cron"). On failure the
    /// cache file is left untouched, every error message is appended to the
    /// error log, and the error is returned.
    pub async fn fetch(&self, feed_url: &str, suffix: &str) -> Result<()> {
        match self.pull(feed_url).await {
            Ok(()) => {
                let message = if suffix.is_empty() {
                    UPDATED_MESSAGE.to_string()
                } else {
                    format!("{} {}", UPDATED_MESSAGE, suffix)
                };
                info!("{}", message);
                // The new cache is already live
                if let Err(log_err) = self.feed_log.append(&message, None) {
                    warn!("Could not write feed log: {}", log_err);
                }
                Ok(())
            }
            Err(err) => {
                warn!("Feed fetch from {} failed: {}", feed_url, err);
                self.record_error(&err);
                Err(err)
            }
        }
    }

    async fn pull(&self, feed_url: &str) -> Result<()> {
        let body = self.client.get_json(feed_url).await?;
        store::write_json(&self.paths.feed_file(), &body)
    }

    /// Append an error's messages to the error log.
    pub fn record_error(&self, err: &FeedError) {
        if let Err(log_err) = self.error_log.append_lines(&err.messages()) {
            warn!("Could not write error log: {}", log_err);
        }
    }

    /// Whether a cache file is present.
    pub fn is_cached(&self) -> bool {
        store::exists(&self.paths.feed_file())
    }

    /// Read the cache file. `Ok(None)` when nothing was ever fetched.
    pub fn read_cached(&self) -> Result<Option<Vec<FeedRecord>>> {
        store::read_json(&self.paths.feed_file())
    }

    /// Cached records, fetching once from `feed_url` if there is no cache yet.
    ///
    /// Never fails: a missing or unreadable cache yields no records.
    pub async fn load(&self, feed_url: &str) -> Vec<FeedRecord> {
        if !self.is_cached() {
            // Failure is already in the error log
            let _ = self.fetch(feed_url, "").await;
        }

        match self.read_cached() {
            Ok(Some(records)) => records,
            Ok(None) => Vec::new(),
            Err(err) => {
                warn!("Ignoring unreadable feed cache: {}", err);
                Vec::new()
            }
        }
    }
}
