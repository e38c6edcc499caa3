// Feed module.
// Fetches the remote job feed over HTTP and keeps the on-disk cache current.

pub mod cache;
pub mod client;
pub mod types;

pub use cache::FeedCache;
pub use client::FeedClient;
pub use types::{FeedRecord, Field};
