//! The model: agent arena, tick counter and scheduler.
//!
//! A [`Model`] owns its agents in a [`Roster`], counts ticks with a
//! [`Clock`], and drives the user's [`StepRules`] once per [`Model::step`].
//! Spatial questions are delegated to the world the model was built with;
//! the world sees the roster on every call. Whatever the world derives for
//! this model (an index, inferred extents) is released when the model is
//! dropped.
//!
//! # Scheduling
//!
//! `step` first advances time, then runs the agent pass and the model
//! callback in the configured order. The agent pass walks the *live*
//! sequence with a cursor rather than a snapshot:
//!
//! - an agent pushed by a callback is appended and visited later in the
//!   same pass;
//! - an agent removed before it was reached is skipped;
//! - an agent that removes itself is not revisited, and the agent that
//!   slides into its slot is visited next.
//!
//! A callback error aborts the pass and is returned from `step`. Time has
//! already advanced at that point and the effects of callbacks that ran
//! earlier in the tick remain in place; nothing is rolled back.
//!
//! # Registration
//!
//! Construction records the model in the process-wide
//! [`registry`](crate::registry). [`Model::dispose`] removes the entry
//! explicitly; dropping an undisposed model removes it as well, so every
//! exit path releases the registration.

use std::fmt;
use std::sync::Arc;

use habitat_types::{Agent, AgentId, ModelId, Roster};
use habitat_world::{World, WorldError};
use tracing::{debug, info};

use crate::clock::Clock;
use crate::error::ModelError;
use crate::registry;
use crate::rules::StepRules;

/// A population of agents evolving on a world under a per-tick rule.
pub struct Model<A, W> {
    id: ModelId,
    name: String,
    world: Arc<W>,
    roster: Roster<A>,
    clock: Clock,
    /// `None` only while a step is running.
    rules: Option<StepRules<A, W>>,
    disposed: bool,
    /// The world's [`World::release`], run on drop.
    release: fn(&W, ModelId),
}

impl<A: Agent, W: World> Model<A, W> {
    /// Create a model named `name` on `world`.
    ///
    /// The world may be passed by value or as an [`Arc`] shared with other
    /// models.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Configuration`] if `rules` has neither an
    /// agent nor a model callback.
    pub fn new(
        name: impl Into<String>,
        world: impl Into<Arc<W>>,
        rules: StepRules<A, W>,
    ) -> Result<Self, ModelError> {
        if rules.is_empty() {
            return Err(ModelError::Configuration {
                reason: "at least one of agent_step or model_step is required".to_owned(),
            });
        }

        let roster = Roster::new();
        let id = roster.owner();
        let name = name.into();
        let world = world.into();
        registry::register(id, name.clone(), world.name());
        info!(
            model = %id,
            name = %name,
            world = world.name(),
            agents_first = rules.agents_first,
            "Model created"
        );

        Ok(Self {
            id,
            name,
            world,
            roster,
            clock: Clock::new(),
            rules: Some(rules),
            disposed: false,
            release: W::release,
        })
    }

    /// Append `agent` and return the new number of agents.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::DuplicateAgent`] if an agent with the same
    /// identity is already in the model.
    pub fn push(&mut self, agent: A) -> Result<usize, ModelError> {
        Ok(self.roster.push(agent)?)
    }

    /// Remove the agent `id` and return it. Agents after it shift down by
    /// one sequence position.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::AgentNotFound`] if the agent is not present.
    pub fn remove(&mut self, id: AgentId) -> Result<A, ModelError> {
        Ok(self.roster.remove(id)?)
    }

    /// Run one tick and return the new time.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::StepInProgress`] when called from a callback
    /// of the running step and [`ModelError::TickOverflow`] when time cannot
    /// advance; in both cases nothing changes. Any error returned by a
    /// callback aborts the tick and is passed through.
    pub fn step(&mut self) -> Result<u64, ModelError> {
        let Some(mut rules) = self.rules.take() else {
            return Err(ModelError::StepInProgress);
        };

        let result = self
            .clock
            .advance()
            .and_then(|tick| self.run_rules(&mut rules).map(|()| tick));

        self.roster.end_pass();
        self.rules = Some(rules);

        if let Ok(tick) = result {
            debug!(model = %self.id, tick, agents = self.roster.len(), "Tick complete");
        }
        result
    }

    fn run_rules(&mut self, rules: &mut StepRules<A, W>) -> Result<(), ModelError> {
        if rules.agents_first {
            self.agent_pass(rules)?;
            self.model_pass(rules)
        } else {
            self.model_pass(rules)?;
            self.agent_pass(rules)
        }
    }

    fn agent_pass(&mut self, rules: &mut StepRules<A, W>) -> Result<(), ModelError> {
        let Some(agent_step) = rules.agent_step.as_mut() else {
            return Ok(());
        };
        self.roster.begin_pass();
        while let Some(id) = self.roster.advance() {
            agent_step(id, self)?;
        }
        self.roster.end_pass();
        Ok(())
    }

    fn model_pass(&mut self, rules: &mut StepRules<A, W>) -> Result<(), ModelError> {
        match rules.model_step.as_mut() {
            Some(model_step) => model_step(self),
            None => Ok(()),
        }
    }

    /// Return the IDs of every agent within `radius` of `position`.
    ///
    /// The order of the result carries no meaning.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::World`] when the world rejects the query.
    pub fn nearby_ids(&self, position: &W::Pos, radius: u64) -> Result<Vec<AgentId>, ModelError> {
        Ok(self.world.nearby(&self.roster, position, radius)?)
    }

    /// Return every agent within `radius` of `position`.
    ///
    /// The order of the result carries no meaning.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::World`] when the world rejects the query.
    pub fn nearby<'a>(
        &'a self,
        position: &W::Pos,
        radius: u64,
    ) -> Result<impl Iterator<Item = &'a A> + use<'a, A, W>, ModelError> {
        let ids = self.nearby_ids(position, radius)?;
        Ok(ids.into_iter().filter_map(move |id| self.roster.get(id)))
    }
}

impl<A: Agent, W: World<Pos = [i64]>> Model<A, W> {
    /// Return the IDs of every other agent within `radius` of agent `id`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::AgentNotFound`] if `id` is not in the model,
    /// [`ModelError::World`] wrapping [`WorldError::IncompatibleAgent`] if
    /// it has no position, or any error of the underlying query.
    pub fn neighbors_of(&self, id: AgentId, radius: u64) -> Result<Vec<AgentId>, ModelError> {
        let agent = self.roster.get(id).ok_or(ModelError::AgentNotFound(id))?;
        let position = agent
            .position()
            .ok_or(WorldError::IncompatibleAgent(id))?;
        let mut found = self.nearby_ids(position.coords(), radius)?;
        found.retain(|&other| other != id);
        Ok(found)
    }
}

impl<A, W> Model<A, W> {
    /// Return this model's identifier.
    pub const fn id(&self) -> ModelId {
        self.id
    }

    /// Return this model's display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return the world this model queries.
    pub const fn world(&self) -> &Arc<W> {
        &self.world
    }

    /// Return the current time (number of completed ticks).
    pub const fn time(&self) -> u64 {
        self.clock.tick()
    }

    /// Return the number of agents.
    pub fn len(&self) -> usize {
        self.roster.len()
    }

    /// Return `true` if the model has no agents.
    pub fn is_empty(&self) -> bool {
        self.roster.is_empty()
    }

    /// Return `true` if agent `id` is in the model.
    pub fn contains(&self, id: AgentId) -> bool {
        self.roster.contains(id)
    }

    /// Iterate over agent IDs in sequence order.
    pub fn ids(&self) -> impl ExactSizeIterator<Item = AgentId> + '_ {
        self.roster.ids()
    }

    /// Iterate over agents in sequence order.
    pub fn agents(&self) -> impl Iterator<Item = &A> + '_ {
        self.roster.iter()
    }

    /// Return the agent at sequence position `index`.
    ///
    /// Positions shift when earlier agents are removed; hold on to IDs, not
    /// indices, across mutations.
    pub fn agent_at(&self, index: usize) -> Option<&A> {
        self.roster.agent_at(index)
    }

    /// Return agent `id`.
    pub fn get(&self, id: AgentId) -> Option<&A> {
        self.roster.get(id)
    }

    /// Return agent `id` mutably.
    ///
    /// The world re-files this agent on the next query, since the caller
    /// may move it.
    pub fn get_mut(&mut self, id: AgentId) -> Option<&mut A> {
        self.roster.get_mut(id)
    }

    /// Return the roster backing this model.
    pub const fn roster(&self) -> &Roster<A> {
        &self.roster
    }

    /// Return `true` once [`dispose`](Self::dispose) has run.
    pub const fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Release this model's process-wide registration.
    ///
    /// The model stays usable afterwards; only the registry entry is gone.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::AlreadyDisposed`] on every call after the
    /// first.
    pub fn dispose(&mut self) -> Result<(), ModelError> {
        if self.disposed {
            return Err(ModelError::AlreadyDisposed(self.id));
        }
        self.disposed = true;
        registry::release(self.id);
        info!(model = %self.id, name = %self.name, time = self.time(), "Model disposed");
        Ok(())
    }
}

impl<A, W> Drop for Model<A, W> {
    fn drop(&mut self) {
        if !self.disposed {
            registry::release(self.id);
        }
        (self.release)(&self.world, self.id);
    }
}

impl<A, W: World> fmt::Display for Model<A, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.roster.len();
        let noun = if count == 1 { "agent" } else { "agents" };
        write!(f, "{}<{}>: {count} {noun}", self.name, self.world.name())
    }
}

impl<A, W> fmt::Debug for Model<A, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("time", &self.clock.tick())
            .field("agents", &self.roster.len())
            .field("disposed", &self.disposed)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use habitat_types::{GridAgent, Position};
    use habitat_world::GridWorld;

    use super::*;

    type Grid = Model<GridAgent, GridWorld>;

    fn agent(coords: &[i64]) -> GridAgent {
        GridAgent::new(Position::new(coords.to_vec()).unwrap())
    }

    fn idle_model() -> Grid {
        Model::new("Model", GridWorld::default(), StepRules::new().model_step(|_m| Ok(()))).unwrap()
    }

    #[test]
    fn fresh_model_is_empty_at_time_zero() {
        let model = idle_model();
        assert_eq!(model.time(), 0);
        assert_eq!(model.len(), 0);
        assert!(model.is_empty());
    }

    #[test]
    fn empty_rules_are_rejected() {
        let result = Grid::new("Model", GridWorld::default(), StepRules::new());
        assert!(matches!(result, Err(ModelError::Configuration { .. })));
    }

    #[test]
    fn push_returns_new_length_and_rejects_duplicates() {
        let mut model = idle_model();
        let a = agent(&[0, 0]);
        let twin = a.clone();
        assert_eq!(model.push(a).unwrap(), 1);
        assert_eq!(model.push(agent(&[1, 1])).unwrap(), 2);
        assert_eq!(
            model.push(twin.clone()),
            Err(ModelError::DuplicateAgent(twin.id()))
        );
        assert_eq!(model.len(), 2);
    }

    #[test]
    fn remove_shifts_later_agents() {
        let mut model = idle_model();
        let ids: Vec<AgentId> = (0..3)
            .map(|i| {
                let a = agent(&[i]);
                let id = a.id();
                model.push(a).unwrap();
                id
            })
            .collect();
        model.remove(ids[0]).unwrap();
        assert_eq!(model.agent_at(0).map(Agent::id), Some(ids[1]));
        assert_eq!(model.remove(ids[0]).err(), Some(ModelError::AgentNotFound(ids[0])));
        assert_eq!(model.len(), 2);
    }

    #[test]
    fn summary_pluralises() {
        let mut model = idle_model();
        assert_eq!(model.to_string(), "Model<GridWorld>: 0 agents");
        model.push(agent(&[0, 0])).unwrap();
        assert_eq!(model.to_string(), "Model<GridWorld>: 1 agent");
        model.push(agent(&[1, 0])).unwrap();
        assert_eq!(model.to_string(), "Model<GridWorld>: 2 agents");
    }

    #[test]
    fn phase_order_follows_agents_first() {
        for agents_first in [true, false] {
            let log = Rc::new(RefCell::new(Vec::new()));
            let agent_log = Rc::clone(&log);
            let model_log = Rc::clone(&log);
            let rules = StepRules::new()
                .agent_step(move |_id, _m: &mut Grid| {
                    agent_log.borrow_mut().push("agent");
                    Ok(())
                })
                .model_step(move |_m| {
                    model_log.borrow_mut().push("model");
                    Ok(())
                })
                .agents_first(agents_first);
            let mut model = Model::new("Model", GridWorld::default(), rules).unwrap();
            model.push(agent(&[0])).unwrap();
            model.step().unwrap();
            let expected = if agents_first {
                vec!["agent", "model"]
            } else {
                vec!["model", "agent"]
            };
            assert_eq!(*log.borrow(), expected);
        }
    }

    #[test]
    fn callback_error_aborts_but_time_advances() {
        let rules = StepRules::new().agent_step(|_id, _m: &mut Grid| Err(ModelError::rule("boom")));
        let mut model = Model::new("Model", GridWorld::default(), rules).unwrap();
        model.push(agent(&[0])).unwrap();
        assert_eq!(model.step(), Err(ModelError::rule("boom")));
        assert_eq!(model.time(), 1);
        // The rules are restored, so the next step runs normally again.
        assert_eq!(model.step(), Err(ModelError::rule("boom")));
        assert_eq!(model.time(), 2);
    }

    #[test]
    fn neighbors_of_excludes_self() {
        let mut model: Grid = Model::new(
            "Model",
            GridWorld::new(false),
            StepRules::new().model_step(|_m| Ok(())),
        )
        .unwrap();
        let a = agent(&[0, 0]);
        let b = agent(&[1, 0]);
        let (a_id, b_id) = (a.id(), b.id());
        model.push(a).unwrap();
        model.push(b).unwrap();
        assert_eq!(model.neighbors_of(a_id, 1).unwrap(), vec![b_id]);
        assert!(matches!(
            model.neighbors_of(AgentId::allocate(), 1),
            Err(ModelError::AgentNotFound(_))
        ));
    }

    #[test]
    fn nearby_yields_agents() {
        let mut model: Grid = Model::new(
            "Model",
            GridWorld::new(false),
            StepRules::new().model_step(|_m| Ok(())),
        )
        .unwrap();
        model.push(agent(&[0, 0])).unwrap();
        model.push(agent(&[5, 5])).unwrap();
        let found: Vec<&GridAgent> = model.nearby(&[4, 4], 1).unwrap().collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].position().unwrap().coords(), &[5, 5]);
    }

    #[test]
    fn drop_releases_registration() {
        let model = idle_model();
        let id = model.id();
        assert!(registry::lookup(id).is_some());
        drop(model);
        assert!(registry::lookup(id).is_none());
    }
}
