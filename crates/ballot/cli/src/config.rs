//! Configuration for the ballot CLI

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main CLI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BallotConfig {
    /// Storage configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Fact delivery configuration
    #[serde(default)]
    pub events: EventsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Snapshot file of the session
    #[serde(default = "default_state_path")]
    pub state_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_path: default_state_path(),
        }
    }
}

/// Fact delivery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsConfig {
    /// Buffer of the live subscriber channel
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// Default value helpers
fn default_state_path() -> PathBuf {
    PathBuf::from("ballot-state.json")
}

fn default_channel_capacity() -> usize {
    ballot_engine::event_bus::DEFAULT_CHANNEL_CAPACITY
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl BallotConfig {
    /// Load configuration from defaults, an optional file and `BALLOT_*` variables
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::Config::try_from(&BallotConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        // BALLOT_STORAGE__STATE_PATH, BALLOT_LOGGING__JSON, ...
        builder = builder.add_source(
            config::Environment::with_prefix("BALLOT")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    pub fn session_config(&self) -> ballot_engine::SessionConfig {
        ballot_engine::SessionConfig {
            event_channel_capacity: self.events.channel_capacity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BallotConfig::default();
        assert_eq!(config.storage.state_path, PathBuf::from("ballot-state.json"));
        assert_eq!(config.events.channel_capacity, 1024);
        assert_eq!(config.logging.level, "warn");
        assert!(!config.logging.json);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ballot.toml");
        std::fs::write(
            &path,
            "[storage]\nstate_path = \"/tmp/election.json\"\n\n[events]\nchannel_capacity = 16\n",
        )
        .unwrap();

        let config = BallotConfig::load(path.to_str()).unwrap();
        assert_eq!(config.storage.state_path, PathBuf::from("/tmp/election.json"));
        assert_eq!(config.events.channel_capacity, 16);
        assert_eq!(config.session_config().event_channel_capacity, 16);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let config = BallotConfig::load(path.to_str()).unwrap();
        assert_eq!(config.events.channel_capacity, 1024);
    }
}
