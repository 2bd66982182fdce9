use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::constants::{DEFAULT_EVENTS_TABLE, DEFAULT_SEED, DEFAULT_SUMMARY_TABLE};
use super::error::ConfigError;
use super::sample_config::SampleConfig;

/// Structure representing the application configuration. Contains the database location,
/// the seed of the random stream, relation names and the samples to generate.
/// Configs are serializable and deserializable to YAML using serde and serde_yaml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub database_path: PathBuf,
    pub seed: u64,
    pub events_table: String,
    pub summary_table: String,
    pub samples: Vec<SampleConfig>,
}

impl Default for Config {
    /// Generate a new Config with the standard three sample set
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("flow_data.db"),
            seed: DEFAULT_SEED,
            events_table: String::from(DEFAULT_EVENTS_TABLE),
            summary_table: String::from(DEFAULT_SUMMARY_TABLE),
            samples: SampleConfig::standard_set(),
        }
    }
}

impl Config {
    /// Read the configuration in a YAML file
    /// Returns a Config if successful
    pub fn read_config_file(config_path: &Path) -> Result<Self, ConfigError> {
        if !config_path.exists() {
            return Err(ConfigError::BadFilePath(config_path.to_path_buf()));
        }

        let yaml_str = std::fs::read_to_string(config_path)?;

        Ok(serde_yaml::from_str::<Self>(&yaml_str)?)
    }

    /// Write the configuration to a YAML file
    pub fn write_config_file(&self, config_path: &Path) -> Result<(), ConfigError> {
        let yaml_str = serde_yaml::to_string(self)?;
        std::fs::write(config_path, yaml_str)?;
        Ok(())
    }

    /// Validate the relation names and every sample configuration.
    ///
    /// SQLite identifiers are case-insensitive, so the two relation names must differ
    /// ignoring ASCII case or the summary would replace the events.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.events_table.trim().is_empty() {
            return Err(ConfigError::EmptyTableName("events_table"));
        }
        if self.summary_table.trim().is_empty() {
            return Err(ConfigError::EmptyTableName("summary_table"));
        }
        if self.events_table.eq_ignore_ascii_case(&self.summary_table) {
            return Err(ConfigError::SharedTableName(self.events_table.clone()));
        }
        for sample in self.samples.iter() {
            sample.validate()?;
        }
        Ok(())
    }

    pub fn total_events(&self) -> usize {
        self.samples.iter().map(|sample| sample.n_events).sum()
    }
}
