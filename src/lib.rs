// jobfeed: fetch, cache and render a remote JSON job feed.
// The binary in main.rs drives these modules from the command line.

pub mod app;
pub mod cache;
pub mod config;
pub mod error;
pub mod feed;
pub mod schedule;
pub mod settings;
pub mod template;

pub use app::{App, Notice};
pub use config::Config;
pub use error::{FeedError, Result};
