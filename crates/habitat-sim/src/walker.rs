//! Random-walk population.
//!
//! Every tick each walker takes one step of `-1`, `0` or `+1` on every
//! axis, then counts the other walkers within the configured radius of its
//! new position. All randomness comes from one seeded [`StdRng`], so a run
//! is reproducible from its seed.

use std::cell::RefCell;
use std::rc::Rc;

use habitat_core::{Model, ModelError, StepRules};
use habitat_types::{Agent, GridAgent, Position};
use habitat_world::{GridConfig, GridWorld};
use rand::Rng;
use rand::rngs::StdRng;
use tracing::{debug, info};

use crate::error::SimError;

/// Number of axes used when the world configuration leaves it open.
pub const DEFAULT_DIMENSION: usize = 2;

/// Per-agent state of a walker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Walker {
    /// Neighbors met so far, summed over all ticks.
    pub encounters: u64,
}

/// A walker agent.
pub type WalkerAgent = GridAgent<Walker>;

/// A model of walkers on a grid.
pub type WalkModel = Model<WalkerAgent, GridWorld>;

/// Return the number of axes a world configuration calls for.
pub fn dimension_of(config: &GridConfig) -> usize {
    config
        .dimension
        .or_else(|| config.extent.as_ref().map(Vec::len))
        .unwrap_or(DEFAULT_DIMENSION)
}

/// Build the step rules of a random walk with neighbor query `radius`.
pub fn walk_rules(rng: Rc<RefCell<StdRng>>, radius: u64) -> StepRules<WalkerAgent, GridWorld> {
    StepRules::new().agent_step(move |id, model: &mut WalkModel| {
        let position = model
            .get_mut(id)
            .ok_or(ModelError::AgentNotFound(id))?
            .position_mut();
        let delta: Vec<i64> = {
            let mut rng = rng.borrow_mut();
            (0..position.dimension())
                .map(|_| rng.random_range(-1..=1))
                .collect()
        };
        position
            .translate(&delta)
            .map_err(|e| ModelError::rule(format!("walker {id} cannot move: {e}")))?;

        let met = model.neighbors_of(id, radius)?.len();
        // The world re-files touched agents only when they moved, so this
        // borrow does not cost the next query a rebuild.
        if let Some(walker) = model.get_mut(id) {
            walker.state.encounters = walker
                .state
                .encounters
                .saturating_add(u64::try_from(met).unwrap_or(u64::MAX));
        }
        Ok(())
    })
}

/// Place `population` walkers uniformly in `[0, span)` on every axis.
///
/// # Errors
///
/// Returns [`SimError::Spawn`] if `span` does not fit a coordinate or a
/// position cannot be built, and [`SimError::Model`] if a push fails.
pub fn spawn(
    model: &mut WalkModel,
    rng: &RefCell<StdRng>,
    population: u32,
    dimension: usize,
    span: u64,
) -> Result<(), SimError> {
    let span = i64::try_from(span)
        .ok()
        .filter(|&s| s > 0)
        .ok_or_else(|| SimError::Spawn {
            message: format!("span {span} is not a usable coordinate range"),
        })?;

    let mut rng = rng.borrow_mut();
    for _ in 0..population {
        let coords: Vec<i64> = (0..dimension).map(|_| rng.random_range(0..span)).collect();
        let position = Position::new(coords).map_err(|e| SimError::Spawn {
            message: e.to_string(),
        })?;
        model.push(GridAgent::with_state(position, Walker::default()))?;
    }
    info!(agents = model.len(), dimension, span, "Population spawned");
    Ok(())
}

/// Return the total number of encounters over all walkers.
pub fn total_encounters(model: &WalkModel) -> u64 {
    model
        .agents()
        .fold(0_u64, |acc, walker| acc.saturating_add(walker.state.encounters))
}

/// Log the walker with the most encounters.
pub fn log_most_social(model: &WalkModel) {
    if let Some(walker) = model.agents().max_by_key(|walker| walker.state.encounters) {
        debug!(
            agent = %walker.id(),
            encounters = walker.state.encounters,
            position = %walker.position().map_or_else(String::new, ToString::to_string),
            "Most social walker"
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;

    use super::*;

    fn model(seed: u64, radius: u64, world: GridWorld) -> (WalkModel, Rc<RefCell<StdRng>>) {
        let rng = Rc::new(RefCell::new(StdRng::seed_from_u64(seed)));
        let model = Model::new("Walk", world, walk_rules(Rc::clone(&rng), radius)).unwrap();
        (model, rng)
    }

    #[test]
    fn dimension_prefers_explicit_settings() {
        assert_eq!(dimension_of(&GridConfig::default()), DEFAULT_DIMENSION);
        let with_extent = GridConfig {
            extent: Some(vec![4, 4, 4]),
            ..GridConfig::default()
        };
        assert_eq!(dimension_of(&with_extent), 3);
        let with_dimension = GridConfig {
            dimension: Some(5),
            ..with_extent
        };
        assert_eq!(dimension_of(&with_dimension), 5);
    }

    #[test]
    fn spawn_places_walkers_inside_span() {
        let (mut m, rng) = model(1, 1, GridWorld::default());
        spawn(&mut m, &rng, 25, 3, 8).unwrap();
        assert_eq!(m.len(), 25);
        assert!(m.agents().all(|w| {
            let coords = w.position().unwrap().coords();
            coords.len() == 3 && coords.iter().all(|c| (0..8).contains(c))
        }));
    }

    #[test]
    fn spawn_rejects_zero_span() {
        let (mut m, rng) = model(1, 1, GridWorld::default());
        assert!(matches!(
            spawn(&mut m, &rng, 3, 2, 0),
            Err(SimError::Spawn { .. })
        ));
    }

    #[test]
    fn walkers_move_at_most_one_cell_per_axis() {
        let (mut m, rng) = model(3, 0, GridWorld::new(false));
        spawn(&mut m, &rng, 10, 2, 50).unwrap();
        let before: Vec<Vec<i64>> = m
            .agents()
            .map(|w| w.position().unwrap().coords().to_vec())
            .collect();
        m.step().unwrap();
        for (walker, old) in m.agents().zip(&before) {
            let new = walker.position().unwrap().coords();
            assert!(new.iter().zip(old).all(|(a, b)| a.abs_diff(*b) <= 1));
        }
    }

    #[test]
    fn crowded_walkers_meet_each_other() {
        // Everyone starts on one cell and the radius covers any two steps.
        let (mut m, rng) = model(5, 2, GridWorld::new(false));
        spawn(&mut m, &rng, 4, 2, 1).unwrap();
        m.step().unwrap();
        assert_eq!(total_encounters(&m), 12);
    }

    #[test]
    fn a_tick_does_not_rebuild_the_index_per_walker() {
        let (mut m, rng) = model(9, 1, GridWorld::new(false));
        spawn(&mut m, &rng, 50, 2, 20).unwrap();
        m.step().unwrap();
        assert_eq!(m.world().index_rebuilds(), 1);
        m.step().unwrap();
        // 200 borrows over two ticks drop the touch log once.
        assert_eq!(m.world().index_rebuilds(), 2);
    }

    #[test]
    fn same_seed_same_walk() {
        let run = || {
            let (mut m, rng) = model(42, 1, GridWorld::default());
            spawn(&mut m, &rng, 30, 2, 16).unwrap();
            for _ in 0..5 {
                m.step().unwrap();
            }
            let positions: Vec<Vec<i64>> = m
                .agents()
                .map(|w| w.position().unwrap().coords().to_vec())
                .collect();
            (positions, total_encounters(&m))
        };
        assert_eq!(run(), run());
    }
}
