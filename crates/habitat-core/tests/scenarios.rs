//! End-to-end scenarios for models driving grid worlds.
//!
//! These tests exercise the public surface only: building models, adding
//! and removing agents from inside callbacks, stepping, querying the world
//! and releasing the registration.

#![allow(
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::missing_panics_doc,
    clippy::too_many_lines
)]

use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use habitat_core::registry::{self, Registration};
use habitat_core::{Model, ModelError, StepRules};
use habitat_types::{Agent, AgentId, GridAgent, ModelId, Position, Roster};
use habitat_world::{GridConfig, GridWorld, World, WorldError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

type Grid = Model<GridAgent, GridWorld>;

// =============================================================================
// Helpers
// =============================================================================

fn agent(coords: &[i64]) -> GridAgent {
    GridAgent::new(Position::new(coords.to_vec()).unwrap())
}

fn idle(name: &str, world: impl Into<Arc<GridWorld>>) -> Grid {
    Model::new(name, world, StepRules::new().model_step(|_m| Ok(()))).unwrap()
}

fn set(ids: Vec<AgentId>) -> BTreeSet<AgentId> {
    ids.into_iter().collect()
}

/// A model whose agent callback records every visit in `log`.
fn recording(
    log: &Rc<RefCell<Vec<AgentId>>>,
    mut extra: impl FnMut(AgentId, &mut Grid) -> Result<(), ModelError> + 'static,
) -> Grid {
    let log = Rc::clone(log);
    let rules = StepRules::new().agent_step(move |id, model: &mut Grid| {
        log.borrow_mut().push(id);
        extra(id, model)
    });
    Model::new("Model", GridWorld::default(), rules).unwrap()
}

fn push_all(model: &mut Grid, count: usize) -> Vec<AgentId> {
    (0..count)
        .map(|i| {
            let a = agent(&[i64::try_from(i).unwrap(), 0]);
            let id = a.id();
            model.push(a).unwrap();
            id
        })
        .collect()
}

// =============================================================================
// Construction and bookkeeping
// =============================================================================

#[test]
fn fresh_models_start_empty_at_time_zero() {
    for periodic in [true, false] {
        let model = idle("Model", GridWorld::new(periodic));
        assert_eq!(model.time(), 0);
        assert_eq!(model.len(), 0);
        assert!(model.ids().next().is_none());
    }
}

#[test]
fn scenario_a_summary_of_single_agent_model() {
    let mut model = idle("Model", GridWorld::default());
    assert_eq!(model.push(agent(&[0, 0])).unwrap(), 1);
    assert_eq!(model.len(), 1);
    assert_eq!(model.to_string(), "Model<GridWorld>: 1 agent");
}

#[test]
fn scenario_e_model_without_rules_is_rejected() {
    let result: Result<Grid, _> = Model::new("Model", GridWorld::default(), StepRules::new());
    assert!(matches!(result, Err(ModelError::Configuration { .. })));
}

#[test]
fn push_and_remove_track_length() {
    let mut model = idle("Model", GridWorld::default());
    let ids = push_all(&mut model, 3);
    assert_eq!(model.len(), 3);

    let removed = model.remove(ids[1]).unwrap();
    assert_eq!(removed.id(), ids[1]);
    assert_eq!(model.len(), 2);
    assert!(!model.contains(ids[1]));

    assert_eq!(
        model.remove(ids[1]).err(),
        Some(ModelError::AgentNotFound(ids[1]))
    );
    assert_eq!(model.len(), 2);
    assert_eq!(model.ids().collect::<Vec<_>>(), vec![ids[0], ids[2]]);
    assert_eq!(model.agent_at(1).map(Agent::id), Some(ids[2]));
    assert!(model.agent_at(2).is_none());
}

#[test]
fn agent_ids_increase_across_models() {
    let mut first = idle("First", GridWorld::default());
    let mut second = idle("Second", GridWorld::default());
    let mut created = Vec::new();
    for round in 0_u8..5 {
        let target = if round % 2 == 0 { &mut first } else { &mut second };
        let a = agent(&[i64::from(round)]);
        created.push(a.id());
        target.push(a).unwrap();
    }
    assert!(created.windows(2).all(|pair| pair[0] < pair[1]));
    assert_ne!(first.id(), second.id());
}

#[test]
fn registry_tracks_model_until_disposed() {
    let mut model = idle("Flock", GridWorld::default());
    let id = model.id();
    assert_eq!(
        registry::lookup(id),
        Some(Registration {
            model: "Flock".to_owned(),
            world: "GridWorld",
        })
    );
    assert!(registry::live_models().contains(&id));

    model.dispose().unwrap();
    assert!(model.is_disposed());
    assert!(registry::lookup(id).is_none());
    assert_eq!(model.dispose(), Err(ModelError::AlreadyDisposed(id)));

    // A disposed model still answers questions about itself.
    model.push(agent(&[0, 0])).unwrap();
    assert_eq!(model.to_string(), "Flock<GridWorld>: 1 agent");
}

#[test]
fn failed_setup_still_releases_registration() {
    fn build(built: &Cell<Option<ModelId>>) -> Result<Grid, ModelError> {
        let mut model = idle("Doomed", GridWorld::new(false));
        built.set(Some(model.id()));
        let a = agent(&[0, 0]);
        let twin = a.clone();
        model.push(a)?;
        model.push(twin)?;
        Ok(model)
    }

    let built = Cell::new(None);
    assert!(matches!(build(&built), Err(ModelError::DuplicateAgent(_))));
    let id = built.get().unwrap();
    assert!(registry::lookup(id).is_none());
}

// =============================================================================
// Stepping
// =============================================================================

#[test]
fn step_advances_time_by_one_regardless_of_population() {
    let mut model = recording(&Rc::new(RefCell::new(Vec::new())), |_id, _m| Ok(()));
    for expected in 1..=4 {
        assert_eq!(model.step().unwrap(), expected);
        assert_eq!(model.time(), expected);
        model.push(agent(&[0, 0])).unwrap();
    }
}

#[test]
fn agents_are_visited_in_sequence_order() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut model = recording(&log, |_id, _m| Ok(()));
    let ids = push_all(&mut model, 4);
    model.step().unwrap();
    assert_eq!(*log.borrow(), ids);
}

#[test]
fn scenario_d_removed_agent_is_not_visited() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut model = recording(&log, |id, model| {
        if model.agent_at(0).map(Agent::id) == Some(id)
            && let Some(second) = model.agent_at(1).map(Agent::id)
        {
            model.remove(second)?;
        }
        Ok(())
    });
    let ids = push_all(&mut model, 2);
    model.step().unwrap();
    assert_eq!(*log.borrow(), vec![ids[0]]);
    assert_eq!(model.len(), 1);
    assert_eq!(model.time(), 1);
}

#[test]
fn self_removal_visits_the_successor_next() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let leaver: Rc<Cell<Option<AgentId>>> = Rc::new(Cell::new(None));
    let target = Rc::clone(&leaver);
    let mut model = recording(&log, move |id, model| {
        if target.get() == Some(id) {
            model.remove(id)?;
        }
        Ok(())
    });
    let ids = push_all(&mut model, 3);
    leaver.set(Some(ids[0]));

    model.step().unwrap();
    assert_eq!(*log.borrow(), ids);
    assert_eq!(model.ids().collect::<Vec<_>>(), vec![ids[1], ids[2]]);
}

#[test]
fn agent_pushed_mid_pass_is_visited_same_tick() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let spawned: Rc<Cell<Option<AgentId>>> = Rc::new(Cell::new(None));
    let slot = Rc::clone(&spawned);
    let mut model = recording(&log, move |_id, model| {
        if slot.get().is_none() {
            let child = agent(&[9, 9]);
            slot.set(Some(child.id()));
            model.push(child)?;
        }
        Ok(())
    });
    let ids = push_all(&mut model, 2);
    model.step().unwrap();

    let child = spawned.get().unwrap();
    assert_eq!(*log.borrow(), vec![ids[0], ids[1], child]);
    assert_eq!(model.len(), 3);
}

#[test]
fn model_first_changes_are_seen_by_agent_pass() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let agent_log = Rc::clone(&log);
    let rules = StepRules::new()
        .agent_step(move |id, _m: &mut Grid| {
            agent_log.borrow_mut().push(id);
            Ok(())
        })
        .model_step(|model| {
            model.push(agent(&[0, 0]))?;
            Ok(())
        })
        .agents_first(false);
    let mut model = Model::new("Model", GridWorld::default(), rules).unwrap();
    model.step().unwrap();
    assert_eq!(log.borrow().len(), 1);
    assert_eq!(log.borrow()[0], model.agent_at(0).unwrap().id());
}

#[test]
fn nested_step_is_rejected_without_touching_time() {
    let inner: Rc<RefCell<Option<Result<u64, ModelError>>>> = Rc::new(RefCell::new(None));
    let record = Rc::clone(&inner);
    let rules = StepRules::new().model_step(move |model: &mut Grid| {
        let time_before = model.time();
        *record.borrow_mut() = Some(model.step());
        assert_eq!(model.time(), time_before);
        Ok(())
    });
    let mut model = Model::new("Model", GridWorld::default(), rules).unwrap();
    assert_eq!(model.step(), Ok(1));
    assert_eq!(*inner.borrow(), Some(Err(ModelError::StepInProgress)));
    assert_eq!(model.step(), Ok(2));
}

#[test]
fn callback_failure_keeps_earlier_effects() {
    let rules = StepRules::new().agent_step(|id, model: &mut Grid| {
        if model.agent_at(0).map(Agent::id) == Some(id) {
            model.push(agent(&[7, 7]))?;
            return Ok(());
        }
        Err(ModelError::rule("second agent fails"))
    });
    let mut model = Model::new("Model", GridWorld::default(), rules).unwrap();
    push_all(&mut model, 2);
    assert_eq!(model.step(), Err(ModelError::rule("second agent fails")));
    assert_eq!(model.time(), 1);
    assert_eq!(model.len(), 3);
}

// =============================================================================
// Spatial queries
// =============================================================================

#[test]
fn scenario_b_bounded_query() {
    let mut model = idle("Model", GridWorld::new(false));
    let near = agent(&[0, 0]);
    let near_id = near.id();
    model.push(near).unwrap();
    model.push(agent(&[5, 5])).unwrap();
    assert_eq!(set(model.nearby_ids(&[0, 0], 1).unwrap()), BTreeSet::from([near_id]));
}

#[test]
fn scenario_c_periodic_query_wraps() {
    let world = GridWorld::from_config(GridConfig {
        extent: Some(vec![6, 6]),
        ..GridConfig::default()
    })
    .unwrap();
    let mut model = idle("Model", world);
    let ids: Vec<AgentId> = [[0_i64, 0], [5, 5]]
        .iter()
        .map(|p| {
            let a = agent(p);
            let id = a.id();
            model.push(a).unwrap();
            id
        })
        .collect();
    let found: BTreeSet<AgentId> = model.nearby(&[0, 0], 1).unwrap().map(Agent::id).collect();
    assert_eq!(found, ids.into_iter().collect());
}

#[test]
fn query_validation_errors_surface_through_the_model() {
    let mut model = idle("Model", GridWorld::default());
    model.push(agent(&[0, 0])).unwrap();
    assert_eq!(
        model.nearby_ids(&[0, 0, 0], 1),
        Err(ModelError::World {
            source: WorldError::DimensionMismatch {
                expected: 2,
                actual: 3
            }
        })
    );
    assert_eq!(
        model.nearby_ids(&[], 1),
        Err(ModelError::World {
            source: WorldError::InvalidPosition { dimension: 0 }
        })
    );
    assert_eq!(model.len(), 1);
    assert_eq!(model.time(), 0);
}

#[test]
fn agents_without_position_are_incompatible() {
    struct Marker(AgentId);

    impl Agent for Marker {
        fn id(&self) -> AgentId {
            self.0
        }
    }

    let mut model: Model<Box<dyn Agent>, GridWorld> = Model::new(
        "Mixed",
        GridWorld::default(),
        StepRules::new().model_step(|_m| Ok(())),
    )
    .unwrap();
    model.push(Box::new(agent(&[0, 0]))).unwrap();
    let marker = AgentId::allocate();
    model.push(Box::new(Marker(marker))).unwrap();

    assert_eq!(
        model.nearby_ids(&[0, 0], 3),
        Err(ModelError::World {
            source: WorldError::IncompatibleAgent(marker)
        })
    );
    assert!(matches!(
        model.neighbors_of(marker, 1),
        Err(ModelError::World {
            source: WorldError::IncompatibleAgent(_)
        })
    ));
}

#[test]
fn repeated_queries_agree() {
    let mut rng = StdRng::seed_from_u64(99);
    let mut model = idle("Model", GridWorld::default());
    for _ in 0..200 {
        let p: [i64; 2] = [rng.random_range(0..40), rng.random_range(0..40)];
        model.push(agent(&p)).unwrap();
    }
    for _ in 0..20 {
        let q: [i64; 2] = [rng.random_range(0..40), rng.random_range(0..40)];
        let radius = rng.random_range(0..6);
        let first = set(model.nearby_ids(&q, radius).unwrap());
        let second = set(model.nearby_ids(&q, radius).unwrap());
        assert_eq!(first, second);
    }
}

#[test]
fn shared_world_answers_each_model_from_its_own_agents() {
    let world = Arc::new(GridWorld::new(false));
    let mut left = idle("Left", Arc::clone(&world));
    let mut right = idle("Right", Arc::clone(&world));

    let l = agent(&[0, 0]);
    let r = agent(&[0, 0]);
    let (l_id, r_id) = (l.id(), r.id());
    left.push(l).unwrap();
    right.push(r).unwrap();

    for _ in 0..3 {
        assert_eq!(left.nearby_ids(&[0, 0], 2).unwrap(), vec![l_id]);
        assert_eq!(right.nearby_ids(&[0, 0], 2).unwrap(), vec![r_id]);
    }
    assert!(Arc::ptr_eq(left.world(), right.world()));
}

#[test]
fn agents_see_moved_neighbors_within_a_tick() {
    // Each agent hops onto the origin, then counts who is already there.
    let counts = Rc::new(RefCell::new(Vec::new()));
    let record = Rc::clone(&counts);
    let rules = StepRules::new().agent_step(move |id, model: &mut Grid| {
        model
            .get_mut(id)
            .unwrap()
            .set_position(Position::new([0_i64, 0]).unwrap());
        record.borrow_mut().push(model.neighbors_of(id, 0)?.len());
        Ok(())
    });
    let world = GridWorld::new(false);
    let mut model = Model::new("Model", world, rules).unwrap();
    for i in 1_i64..=3 {
        model.push(agent(&[i * 10, i * 10])).unwrap();
    }
    model.step().unwrap();
    assert_eq!(*counts.borrow(), vec![0, 1, 2]);
}

#[test]
fn distant_push_leaves_neighborhoods_alone() {
    let mut model = idle("Model", GridWorld::default());
    let origin = agent(&[0]);
    let edge = agent(&[5]);
    let (origin_id, edge_id) = (origin.id(), edge.id());
    model.push(origin).unwrap();
    model.push(edge).unwrap();

    // The first query fixes a ring of 6 cells.
    assert_eq!(model.neighbors_of(edge_id, 1).unwrap(), vec![origin_id]);
    model.push(agent(&[8])).unwrap();
    model.push(agent(&[501])).unwrap();
    assert_eq!(model.neighbors_of(edge_id, 1).unwrap(), vec![origin_id]);
    assert_eq!(model.neighbors_of(origin_id, 1).unwrap(), vec![edge_id]);
}

// =============================================================================
// World release
// =============================================================================

/// A world that answers nothing and records which models let go of it.
#[derive(Default)]
struct Tally {
    released: Mutex<Vec<ModelId>>,
}

impl World for Tally {
    type Pos = [i64];

    fn name(&self) -> &'static str {
        "Tally"
    }

    fn nearby<A: Agent>(
        &self,
        _roster: &Roster<A>,
        _position: &[i64],
        _radius: u64,
    ) -> Result<Vec<AgentId>, WorldError> {
        Ok(Vec::new())
    }

    fn release(&self, owner: ModelId) {
        self.released.lock().unwrap().push(owner);
    }
}

#[test]
fn dropping_a_model_releases_the_world() {
    let world = Arc::new(Tally::default());
    let rules = || StepRules::<GridAgent, Tally>::new().model_step(|_m| Ok(()));

    let kept = Model::new("Kept", Arc::clone(&world), rules()).unwrap();
    let mut disposed = Model::new("Disposed", Arc::clone(&world), rules()).unwrap();
    let (kept_id, disposed_id) = (kept.id(), disposed.id());

    disposed.dispose().unwrap();
    assert!(world.released.lock().unwrap().is_empty());

    drop(disposed);
    drop(kept);
    assert_eq!(*world.released.lock().unwrap(), vec![disposed_id, kept_id]);
}
