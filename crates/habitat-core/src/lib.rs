//! Model scheduler, agent registry and run loop for the Habitat kernel.
//!
//! A [`Model`] owns a population of agents and a tick counter, and runs a
//! user-supplied [`StepRules`] once per tick. Spatial queries go through
//! the [`World`](habitat_world::World) the model was built with.
//!
//! # Modules
//!
//! - [`model`] -- [`Model`]: agent arena, scheduler and query front end.
//! - [`rules`] -- [`StepRules`]: the per-agent and per-model callbacks.
//! - [`clock`] -- Checked tick counter.
//! - [`registry`] -- Process-wide lookup of live models.
//! - [`config`] -- Loading `habitat.yaml` into [`SimulationConfig`].
//! - [`runner`] -- Fixed-length runs with per-tick observers.
//! - [`error`] -- [`ModelError`].

pub mod clock;
pub mod config;
pub mod error;
pub mod model;
pub mod registry;
pub mod rules;
pub mod runner;

pub use config::{ConfigError, SimulationConfig};
pub use error::ModelError;
pub use model::Model;
pub use rules::StepRules;
pub use runner::{LoggingObserver, NoOpObserver, RunSummary, TickObserver, TickSummary};
