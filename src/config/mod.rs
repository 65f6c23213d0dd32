//! Configuration for the notification subsystem.
//!
//! Settings load from multiple sources with priority:
//! 1. Default values (hardcoded)
//! 2. Optional config file
//! 3. Environment variables (highest priority)
//!
//! All runtime knobs (topic, partition set, offset policy, timeouts,
//! batching) are explicit fields here and reach the notifier as a value
//! object at construction time.

mod log;
mod monitoring;
mod notifier;
pub use log::*;
pub use monitoring::*;
pub use notifier::*;


//---
use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;

use crate::Result;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    /// Partitioned log topology: topic, partition set
    #[serde(default)]
    pub log: LogConfig,
    /// Notifier runtime parameters: offsets, backlog timeout, batching
    #[serde(default)]
    pub notifier: NotifierConfig,
    /// Metrics endpoint settings
    #[serde(default)]
    pub monitoring: MonitoringConfig,
}

impl Settings {
    /// Load configuration with proper priority ordering.
    ///
    /// # Arguments
    /// * `config_path` - Optional path to a TOML config file
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut config = Config::builder();

        if let Some(path) = config_path {
            config = config.add_source(File::with_name(path).required(true));
        }

        // Environment variables (highest priority)
        config = config.add_source(
            Environment::with_prefix("RELAY")
                .separator("__")
                .ignore_empty(true)
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("log.partitions"),
        );

        let settings: Settings = config.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validates all subsystem configurations
    pub fn validate(&self) -> Result<()> {
        self.log.validate()?;
        self.notifier.validate()?;
        self.monitoring.validate()?;
        Ok(())
    }
}
