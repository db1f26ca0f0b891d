//! Configuration loading for the simulation runner.
//!
//! A run is described by one YAML file: where the content lives, how to
//! log, the engine tunables, and the script to play.
//!
//! ```yaml
//! content_path: demos/social.yaml
//! logging: { level: info, format: pretty }
//! engine:
//!   max_event_depth: 4
//! script:
//!   - fire: { event: Insult, agents: [bob, alice] }
//!   - tick
//!   - ticks: 3
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tdrs_core::EngineConfig;

/// Environment variable that overrides `content_path`.
pub const CONTENT_PATH_ENV: &str = "TDRS_CONTENT";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level runner configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SimulationConfig {
    /// Content file to load, relative to the working directory.
    #[serde(default = "default_content_path")]
    pub content_path: PathBuf,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Engine tunables and stat schemas.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Steps to play, in order. Steps with arguments are written as
    /// single-key maps (`- ticks: 3`).
    #[serde(
        default,
        deserialize_with = "serde_yml::with::singleton_map_recursive::deserialize"
    )]
    pub script: Vec<ScriptStep>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            content_path: default_content_path(),
            logging: LoggingConfig::default(),
            engine: EngineConfig::default(),
            script: Vec::new(),
        }
    }
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `TDRS_CONTENT`, when set, overrides `content_path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var(CONTENT_PATH_ENV) {
            self.content_path = PathBuf::from(path);
        }
    }
}

fn default_content_path() -> PathBuf {
    PathBuf::from("content.yaml")
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_owned()
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// One step of a scripted run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptStep {
    /// Fire an event with agents bound to its roles in order.
    Fire {
        /// Event to fire.
        event: String,
        /// Agent IDs, one per role.
        agents: Vec<String>,
    },
    /// Advance trait durations by one tick.
    Tick,
    /// Advance trait durations by several ticks.
    Ticks(u32),
}
