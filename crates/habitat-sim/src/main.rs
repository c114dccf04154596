//! Random-walk simulation binary for the Habitat kernel.
//!
//! Loads `habitat.yaml` (or the path given as the first argument), builds a
//! grid world and a model of random walkers, and runs it for the configured
//! number of ticks.
//!
//! # Startup Sequence
//!
//! 1. Load configuration (defaults when the file is missing)
//! 2. Initialize structured logging (tracing)
//! 3. Build the grid world from the `world` section
//! 4. Build the model and spawn the population
//! 5. Run the simulation loop
//! 6. Release the model and log the result

mod error;
mod walker;

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use habitat_core::{LoggingObserver, Model, SimulationConfig, runner};
use habitat_world::GridWorld;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::SimError;

/// Configuration file read when no path is given.
const DEFAULT_CONFIG_PATH: &str = "habitat.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, setup, or any tick fails.
fn main() -> Result<(), SimError> {
    let config_path = std::env::args_os()
        .nth(1)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    let (config, from_file) = load_config(&config_path)?;

    // RUST_LOG wins over the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!("habitat-sim starting");
    if from_file {
        info!(path = %config_path.display(), "Configuration loaded");
    } else {
        info!(path = %config_path.display(), "Config file not found, using defaults");
    }
    info!(
        ticks = config.run.ticks,
        population = config.run.population,
        radius = config.run.radius,
        seed = config.run.seed,
        periodic = config.world.periodic,
        metric = ?config.world.metric,
        "Run parameters"
    );

    let world = GridWorld::from_config(config.world.clone())?;
    let dimension = walker::dimension_of(&config.world);

    let rng = Rc::new(RefCell::new(StdRng::seed_from_u64(config.run.seed)));
    let rules = walker::walk_rules(Rc::clone(&rng), config.run.radius)
        .agents_first(config.model.agents_first);
    let mut model = Model::new(config.model.name.clone(), world, rules)?;

    walker::spawn(
        &mut model,
        &rng,
        config.run.population,
        dimension,
        config.run.span,
    )?;

    let mut observer = LoggingObserver::new(config.run.report_every);
    let summary = runner::run(&mut model, config.run.ticks, &mut observer)?;

    walker::log_most_social(&model);
    info!(
        ticks_run = summary.ticks_run,
        final_time = summary.final_time,
        agents = summary.agents,
        encounters = walker::total_encounters(&model),
        index_rebuilds = model.world().index_rebuilds(),
        "{model}"
    );

    model.dispose()?;
    info!("habitat-sim finished");
    Ok(())
}

/// Load configuration from `path`, falling back to defaults when the file
/// does not exist. The flag reports whether the file was read.
fn load_config(path: &Path) -> Result<(SimulationConfig, bool), SimError> {
    if path.exists() {
        Ok((SimulationConfig::from_file(path)?, true))
    } else {
        let mut config = SimulationConfig::default();
        config.apply_overrides(|name| std::env::var(name).ok())?;
        Ok((config, false))
    }
}
