//! Spatial worlds for the Habitat simulation kernel.
//!
//! A world answers one question for a model: which agents lie within
//! radius `r` of a position. The model hands over its [`Roster`] on every
//! call; whatever the world derives from it is keyed to that roster's
//! owner and checked against its revision, and is forgotten when the model
//! releases the world.
//!
//! # Modules
//!
//! - [`world`] -- The [`World`] trait every topology implements.
//! - [`grid`] -- [`GridWorld`]: periodic or bounded N-dimensional grid.
//! - [`config`] -- [`GridConfig`] and the distance [`Metric`].
//! - [`topology`] -- Per-axis distance and wrap-around arithmetic.
//! - [`index`] -- Uniform bucket index used to restrict neighbor sweeps.
//! - [`error`] -- Error types for spatial queries.
//!
//! [`Roster`]: habitat_types::Roster

pub mod config;
pub mod error;
pub mod grid;
pub mod index;
pub mod topology;
pub mod world;

// Re-export primary types at crate root.
pub use config::{GridConfig, Metric};
pub use error::WorldError;
pub use grid::GridWorld;
pub use world::World;
