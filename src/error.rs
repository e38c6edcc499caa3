// Error types for jobfeed.
// Covers feed transport and validation failures, cache I/O, and settings errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("{}", transport_message(.0))]
    Transport(#[from] reqwest::Error),

    #[error("Error retrieving feed. Status: {0}")]
    Status(u16),

    #[error("Invalid feed content type: {0}")]
    ContentType(String),

    #[error("Invalid feed JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid settings: {0}")]
    Settings(String),

    #[error("Unknown schedule: {0}")]
    Schedule(String),
}

impl FeedError {
    /// Human-readable messages for the error log, one line each.
    pub fn messages(&self) -> Vec<String> {
        self.to_string()
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Flatten a reqwest error and its sources into a single message.
fn transport_message(err: &reqwest::Error) -> String {
    use std::error::Error as _;

    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

pub type Result<T> = std::result::Result<T, FeedError>;
