//! Error types for the `habitat-types` crate.

use crate::ids::AgentId;

/// Errors raised when building or editing a [`Position`].
///
/// [`Position`]: crate::position::Position
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PositionError {
    /// The coordinate vector is empty or longer than the supported maximum.
    #[error("invalid position dimension {dimension} (expected 1..={max})")]
    InvalidDimension {
        /// The offending dimension.
        dimension: usize,
        /// The largest supported dimension.
        max: usize,
    },

    /// Two coordinate vectors of different dimension were combined.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension of the position being edited.
        expected: usize,
        /// Dimension of the supplied operand.
        actual: usize,
    },

    /// A coordinate left the `i64` range.
    #[error("coordinate overflow on axis {axis}")]
    Overflow {
        /// The axis that overflowed.
        axis: usize,
    },
}

/// Errors raised by [`Roster`] membership operations.
///
/// [`Roster`]: crate::roster::Roster
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RosterError {
    /// The agent is already a member of this roster.
    #[error("agent {0} is already present")]
    DuplicateAgent(AgentId),

    /// The agent is not a member of this roster.
    #[error("agent {0} not found")]
    AgentNotFound(AgentId),
}
