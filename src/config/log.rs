use std::collections::HashSet;

use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Topology of the partitioned log the notifier publishes to and consumes
/// from. Every node consumes every listed partition; routing of outbound
/// events to a partition is decided by metric ownership, not key hashing.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LogConfig {
    /// Topic carrying persist notifications
    #[serde(default = "default_topic")]
    pub topic: String,

    /// Full partition set of the topic
    #[serde(default = "default_partitions")]
    pub partitions: Vec<i32>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            topic: default_topic(),
            partitions: default_partitions(),
        }
    }
}

impl LogConfig {
    pub fn validate(&self) -> Result<()> {
        if self.topic.is_empty() {
            return Err(Error::Config(ConfigError::Message(
                "log.topic must not be empty".into(),
            )));
        }

        if self.partitions.is_empty() {
            return Err(Error::Config(ConfigError::Message(
                "log.partitions must list at least one partition".into(),
            )));
        }

        let mut seen = HashSet::new();
        for partition in &self.partitions {
            if *partition < 0 {
                return Err(Error::Config(ConfigError::Message(format!(
                    "log.partitions contains negative partition {}",
                    partition
                ))));
            }
            if !seen.insert(*partition) {
                return Err(Error::Config(ConfigError::Message(format!(
                    "log.partitions lists partition {} more than once",
                    partition
                ))));
            }
        }

        Ok(())
    }
}

fn default_topic() -> String {
    "metric-persist".to_string()
}

fn default_partitions() -> Vec<i32> {
    vec![0]
}
