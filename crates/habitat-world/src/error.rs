//! Error types for the `habitat-world` crate.
//!
//! All fallible spatial operations return [`WorldError`]. Every variant is
//! raised before any state is touched, so a failed query leaves both the
//! model and the world's cached index exactly as they were.

use habitat_types::AgentId;

/// Errors that can occur while answering a spatial query.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    /// A position or agent does not have the dimension the query requires.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension established by the world or the first agent.
        expected: usize,
        /// Dimension that was supplied.
        actual: usize,
    },

    /// The query position has an unsupported number of axes.
    #[error("invalid query position with {dimension} axes")]
    InvalidPosition {
        /// Number of axes supplied.
        dimension: usize,
    },

    /// An agent in the model does not carry a position.
    #[error("agent {0} has no position and cannot be located")]
    IncompatibleAgent(AgentId),

    /// The world configuration cannot be used.
    #[error("invalid world configuration: {reason}")]
    InvalidConfig {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },

    /// A coordinate computation left the representable range.
    #[error("arithmetic overflow in spatial calculation")]
    ArithmeticOverflow,
}
