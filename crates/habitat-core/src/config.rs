//! Configuration loading and typed config structures for Habitat runs.
//!
//! A run is described by `habitat.yaml`. This module defines structs that
//! mirror the YAML layout and a loader that reads, overrides and validates
//! it. Every section and field has a default, so an empty file is a valid
//! configuration.
//!
//! ```yaml
//! world:
//!   periodic: true
//!   extent: [64, 64]
//!   metric: chebyshev
//! model:
//!   name: Flock
//!   agents_first: true
//! run:
//!   ticks: 200
//!   population: 150
//!   radius: 2
//!   seed: 7
//! logging:
//!   level: debug
//! ```
//!
//! `HABITAT_TICKS` and `HABITAT_SEED` override `run.ticks` and `run.seed`.

use std::path::Path;

use habitat_world::GridConfig;
use serde::{Deserialize, Serialize};

/// Environment variable overriding [`RunConfig::ticks`].
pub const TICKS_ENV: &str = "HABITAT_TICKS";

/// Environment variable overriding [`RunConfig::seed`].
pub const SEED_ENV: &str = "HABITAT_SEED";

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

    /// An environment override could not be parsed.
    #[error("invalid value {value:?} for {name}")]
    InvalidOverride {
        /// Name of the environment variable.
        name: &'static str,
        /// The rejected value.
        value: String,
    },

    /// The configuration parsed but cannot be used.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration of a simulation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Grid world settings.
    #[serde(default)]
    pub world: GridConfig,

    /// Model settings.
    #[serde(default)]
    pub model: ModelSettings,

    /// Run length and population parameters.
    #[serde(default)]
    pub run: RunConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file, apply environment overrides and
    /// validate the result.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or the
    /// errors of [`apply_overrides`](Self::apply_overrides) and
    /// [`validate`](Self::validate).
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, apply environment overrides
    /// and validate the result.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or the
    /// errors of [`apply_overrides`](Self::apply_overrides) and
    /// [`validate`](Self::validate).
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.apply_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Override run settings from `lookup`, which maps a variable name to
    /// its value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOverride`] if a value is not an
    /// unsigned integer.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(ticks) = parse_override(&lookup, TICKS_ENV)? {
            self.run.ticks = ticks;
        }
        if let Some(seed) = parse_override(&lookup, SEED_ENV)? {
            self.run.seed = seed;
        }
        Ok(())
    }

    /// Check the configuration for values that can never be honoured.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for an unusable world section or a
    /// zero walk span.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.world.validate().map_err(|e| ConfigError::Invalid {
            reason: e.to_string(),
        })?;
        if self.run.span == 0 {
            return Err(ConfigError::Invalid {
                reason: "run.span must be at least 1".to_owned(),
            });
        }
        Ok(())
    }
}

fn parse_override(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<u64>, ConfigError> {
    lookup(name)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_err| ConfigError::InvalidOverride { name, value })
        })
        .transpose()
}

/// Settings of the model a run drives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSettings {
    /// Display name used in summaries and logs.
    #[serde(default = "default_model_name")]
    pub name: String,

    /// Run the agent pass before the model callback.
    #[serde(default = "default_agents_first")]
    pub agents_first: bool,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            name: default_model_name(),
            agents_first: default_agents_first(),
        }
    }
}

/// Run length and population parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Number of ticks to run.
    #[serde(default = "default_ticks")]
    pub ticks: u64,

    /// Number of agents created before the first tick.
    #[serde(default = "default_population")]
    pub population: u32,

    /// Neighbor query radius used by the agents.
    #[serde(default = "default_radius")]
    pub radius: u64,

    /// Random seed for reproducibility.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Agents are placed in `[0, span)` on every axis.
    #[serde(default = "default_span")]
    pub span: u64,

    /// Emit a progress line every N ticks (0 disables it).
    #[serde(default = "default_report_every")]
    pub report_every: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            ticks: default_ticks(),
            population: default_population(),
            radius: default_radius(),
            seed: default_seed(),
            span: default_span(),
            report_every: default_report_every(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level used when `RUST_LOG` is unset (trace, debug, info, warn,
    /// error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// =============================================================================
// Defaults
// =============================================================================

fn default_model_name() -> String {
    "Habitat".to_owned()
}

const fn default_agents_first() -> bool {
    true
}

const fn default_ticks() -> u64 {
    100
}

const fn default_population() -> u32 {
    100
}

const fn default_radius() -> u64 {
    2
}

const fn default_seed() -> u64 {
    42
}

const fn default_span() -> u64 {
    64
}

const fn default_report_every() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_owned()
}
