//! The agent contract and the stock grid agent.
//!
//! To the kernel an agent is an opaque payload with an identity. The only
//! other thing it may expose is a grid [`Position`]; agents that have none
//! can live in a model but cannot take part in proximity queries.
//!
//! Identity is the [`AgentId`], assigned once when the agent is built.
//! Cloning an agent copies its id, so a clone is the *same* agent as far as
//! a model is concerned and cannot be added next to the original.

use crate::ids::AgentId;
use crate::position::Position;

/// A participant in a simulation.
pub trait Agent {
    /// Return this agent's immutable identifier.
    fn id(&self) -> AgentId;

    /// Return this agent's grid position, if it has one.
    fn position(&self) -> Option<&Position> {
        None
    }
}

impl<T: Agent + ?Sized> Agent for Box<T> {
    fn id(&self) -> AgentId {
        (**self).id()
    }

    fn position(&self) -> Option<&Position> {
        (**self).position()
    }
}

/// An agent living on a grid world, carrying user state `S`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridAgent<S = ()> {
    id: AgentId,
    position: Position,
    /// Behaviour-specific state owned by the agent.
    pub state: S,
}

impl GridAgent {
    /// Create a stateless grid agent at `position`.
    pub fn new(position: Position) -> Self {
        Self::with_state(position, ())
    }
}

impl<S> GridAgent<S> {
    /// Create a grid agent at `position` carrying `state`.
    ///
    /// A fresh [`AgentId`] is allocated on every call.
    pub fn with_state(position: Position, state: S) -> Self {
        Self {
            id: AgentId::allocate(),
            position,
            state,
        }
    }

    /// Replace this agent's position.
    pub fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    /// Return this agent's position mutably.
    pub const fn position_mut(&mut self) -> &mut Position {
        &mut self.position
    }
}

impl<S> Agent for GridAgent<S> {
    fn id(&self) -> AgentId {
        self.id
    }

    fn position(&self) -> Option<&Position> {
        Some(&self.position)
    }
}
