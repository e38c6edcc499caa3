// Cache module for local filesystem state.
// Stores the fetched feed, the stored settings, and the bounded event logs.

pub mod log;
pub mod paths;
pub mod store;

pub use log::{LogFile, timestamp_prefix};
pub use paths::{CachePaths, LogKind};
pub use store::{delete, exists, read_json, read_text, write_json, write_text};
