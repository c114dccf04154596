//! Error types for the `habitat-core` crate.
//!
//! [`ModelError`] is the single error type surfaced by [`Model`] and by
//! the callbacks it drives. Precondition failures (`Configuration`,
//! `DuplicateAgent`, `AgentNotFound`, the spatial `World` variants) are
//! raised before anything is mutated. [`ModelError::Rule`] is the variant
//! callbacks use to report their own failures; it aborts the running tick.
//!
//! [`Model`]: crate::model::Model

use habitat_types::{AgentId, ModelId, RosterError};
use habitat_world::WorldError;

/// Errors raised by model construction, membership changes, stepping and
/// spatial queries.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// The model cannot be built as configured.
    #[error("invalid model configuration: {reason}")]
    Configuration {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },

    /// The agent is already in this model.
    #[error("agent {0} is already in the model")]
    DuplicateAgent(AgentId),

    /// The agent is not in this model.
    #[error("agent {0} not found in the model")]
    AgentNotFound(AgentId),

    /// A spatial query failed its preconditions.
    #[error("world query failed: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },

    /// `step` was called from inside a callback of the running step.
    #[error("step called while a step is already running")]
    StepInProgress,

    /// The tick counter would exceed `u64::MAX`.
    #[error("tick counter overflow: cannot advance beyond u64::MAX")]
    TickOverflow,

    /// `dispose` was called on a model that was already disposed.
    #[error("model {0} has already been disposed")]
    AlreadyDisposed(ModelId),

    /// A user callback reported a failure.
    #[error("step rule failed: {message}")]
    Rule {
        /// Message supplied by the callback.
        message: String,
    },
}

impl ModelError {
    /// Build a [`ModelError::Rule`] from any displayable message.
    pub fn rule(message: impl Into<String>) -> Self {
        Self::Rule {
            message: message.into(),
        }
    }
}

impl From<RosterError> for ModelError {
    fn from(err: RosterError) -> Self {
        match err {
            RosterError::DuplicateAgent(id) => Self::DuplicateAgent(id),
            RosterError::AgentNotFound(id) => Self::AgentNotFound(id),
        }
    }
}
