//! Shared type definitions for the Habitat simulation kernel.
//!
//! This crate holds everything the world and the model crates agree on:
//! identifiers, grid positions, the [`Agent`] contract, and the [`Roster`]
//! arena a model keeps its agents in.
//!
//! # Modules
//!
//! - [`ids`] -- Process-unique integer identifiers for agents and models
//! - [`position`] -- Validated fixed-dimension grid coordinates
//! - [`agent`] -- The [`Agent`] trait and the stock [`GridAgent`]
//! - [`roster`] -- Ordered, id-addressable agent arena with a live cursor
//! - [`error`] -- Error types for position and roster operations

pub mod agent;
pub mod error;
pub mod ids;
pub mod position;
pub mod roster;

// Re-export all public types at crate root for convenience.
pub use agent::{Agent, GridAgent};
pub use error::{PositionError, RosterError};
pub use ids::{AgentId, ModelId};
pub use position::{MAX_DIMENSION, Position, validate_dimension};
pub use roster::Roster;
