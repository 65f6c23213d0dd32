//! Shared fixtures for unit tests: an in-process partitioned log, a
//! recording handler, and settings builders.
mod memory_log;
mod recording_handler;

pub use memory_log::*;
pub use recording_handler::*;

use crate::Settings;

/// Settings for a single-topic test cluster over the given partitions,
/// starting from the oldest offset with metrics serving disabled.
pub fn test_settings(partitions: Vec<i32>) -> Settings {
    let mut settings = Settings::default();
    settings.log.topic = "persist-test".to_string();
    settings.log.partitions = partitions;
    settings.notifier.offset_reset = "oldest".to_string();
    settings
}

/// A well-formed saved-chunk key owned by `org`.
pub fn test_key(org: u32) -> String {
    format!("{}.0a1b2c3d4e5f60718293a4b5c6d7e8f9_sum_3600", org)
}
