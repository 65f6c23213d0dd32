use std::time::Duration;

use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::constants::FLUSH_INTERVAL_MS;
use crate::constants::FLUSH_MAX_EVENTS;
use crate::constants::PUBLISH_BACKOFF_MS;
use crate::Error;
use crate::Result;

/// Where a partition consumer starts reading at boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffsetPolicy {
    /// Start-of-log sentinel
    Oldest,
    /// End-of-log sentinel
    Newest,
    /// Offset at wall-clock `now - duration`, falling back to oldest when
    /// the query fails
    Lookback(Duration),
}

/// Runtime parameters of the notifier: startup offsets, the backlog gate
/// timeout, and batch-producer tuning.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NotifierConfig {
    /// One of `oldest`, `newest`, `lookback`
    #[serde(default = "default_offset_reset")]
    pub offset_reset: String,

    /// Lookback window in ms, used when `offset_reset = "lookback"`
    #[serde(default = "default_offset_lookback_ms")]
    pub offset_lookback_ms: u64,

    /// Upper bound on waiting for the startup backlog to be replayed
    /// before the node proceeds degraded
    #[serde(default = "default_backlog_process_timeout_ms")]
    pub backlog_process_timeout_ms: u64,

    /// Flush the send buffer once it holds this many events
    #[serde(default = "default_flush_max_events")]
    pub flush_max_events: usize,

    /// Flush the send buffer on this interval regardless of size
    #[serde(default = "default_flush_interval_ms")]
    pub flush_interval_ms: u64,

    /// Fixed wait between publish retry attempts
    #[serde(default = "default_publish_backoff_ms")]
    pub publish_backoff_ms: u64,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            offset_reset: default_offset_reset(),
            offset_lookback_ms: default_offset_lookback_ms(),
            backlog_process_timeout_ms: default_backlog_process_timeout_ms(),
            flush_max_events: default_flush_max_events(),
            flush_interval_ms: default_flush_interval_ms(),
            publish_backoff_ms: default_publish_backoff_ms(),
        }
    }
}

impl NotifierConfig {
    /// The configured start-offset policy, shared by every partition.
    pub fn offset_policy(&self) -> OffsetPolicy {
        match self.offset_reset.as_str() {
            "oldest" => OffsetPolicy::Oldest,
            "newest" => OffsetPolicy::Newest,
            // validate() restricts the field to the three known modes
            _ => OffsetPolicy::Lookback(Duration::from_millis(self.offset_lookback_ms)),
        }
    }

    pub fn backlog_process_timeout(&self) -> Duration {
        Duration::from_millis(self.backlog_process_timeout_ms)
    }

    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }

    pub fn publish_backoff(&self) -> Duration {
        Duration::from_millis(self.publish_backoff_ms)
    }

    pub fn validate(&self) -> Result<()> {
        match self.offset_reset.as_str() {
            "oldest" | "newest" => {}
            "lookback" => {
                if self.offset_lookback_ms == 0 {
                    return Err(Error::Config(ConfigError::Message(
                        "notifier.offset_lookback_ms must be greater than 0 for lookback".into(),
                    )));
                }
            }
            other => {
                return Err(Error::Config(ConfigError::Message(format!(
                    "notifier.offset_reset must be oldest, newest or lookback, got {:?}",
                    other
                ))));
            }
        }

        if self.backlog_process_timeout_ms == 0 {
            return Err(Error::Config(ConfigError::Message(
                "notifier.backlog_process_timeout_ms must be greater than 0".into(),
            )));
        }

        if self.flush_max_events == 0 {
            return Err(Error::Config(ConfigError::Message(
                "notifier.flush_max_events must be greater than 0".into(),
            )));
        }

        if self.flush_interval_ms == 0 {
            return Err(Error::Config(ConfigError::Message(
                "notifier.flush_interval_ms must be greater than 0".into(),
            )));
        }

        Ok(())
    }
}

fn default_offset_reset() -> String {
    "newest".to_string()
}

fn default_offset_lookback_ms() -> u64 {
    // 6 hours
    21_600_000
}

fn default_backlog_process_timeout_ms() -> u64 {
    // 1 minute
    60_000
}

fn default_flush_max_events() -> usize {
    FLUSH_MAX_EVENTS
}

fn default_flush_interval_ms() -> u64 {
    FLUSH_INTERVAL_MS
}

fn default_publish_backoff_ms() -> u64 {
    PUBLISH_BACKOFF_MS
}
