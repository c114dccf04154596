//! Error types for the simulation binary.

/// Top-level error for `habitat-sim`.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: habitat_core::ConfigError,
    },

    /// The world could not be built from its configuration.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: habitat_world::WorldError,
    },

    /// Model construction or a tick failed.
    #[error("model error: {source}")]
    Model {
        /// The underlying model error.
        #[from]
        source: habitat_core::ModelError,
    },

    /// Seeding the population failed.
    #[error("spawn error: {message}")]
    Spawn {
        /// Description of the spawn failure.
        message: String,
    },
}
