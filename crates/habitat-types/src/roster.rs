//! The agent arena a model keeps its population in.
//!
//! A [`Roster`] offers two independent access paths into the same owned
//! collection:
//!
//! - **by identity**: an `AgentId -> agent` map, stable for the agent's
//!   whole stay in the roster;
//! - **by sequence position**: an ordered list of IDs preserving insertion
//!   order. Removing an agent shifts every later agent down by one, so a
//!   sequence index is never a stable handle.
//!
//! Every mutation bumps a revision counter. Derived structures (such as a
//! world's spatial index) compare revisions to decide whether they are
//! stale. Handing out a mutable agent borrow counts as a mutation because
//! the caller may move the agent. Such borrows are also recorded in a touch
//! log, so a derived structure that is behind by a few borrows can catch up
//! with [`Roster::touched_since`] instead of starting over. Pushing or
//! removing an agent clears the log.
//!
//! The roster also carries the scheduler's iteration cursor. A pass walks
//! the live sequence rather than a copy of it: agents appended during the
//! pass are reached later in the same pass, agents removed before being
//! reached are skipped, and removing an agent at or behind the cursor
//! (including the agent currently being visited) shifts the cursor so the
//! next unvisited agent is not missed.

use std::collections::BTreeMap;

use tracing::trace;

use crate::agent::Agent;
use crate::error::RosterError;
use crate::ids::{AgentId, ModelId};

/// Touch log entries kept before the log is dropped, whatever the size.
const MIN_TOUCH_LOG: usize = 64;

/// Ordered, id-addressable collection of agents owned by one model.
///
/// Not `Clone`, and every roster allocates its own owner id: an
/// `(owner, revision)` pair identifies exactly one roster state.
#[derive(Debug)]
pub struct Roster<A> {
    /// The model this roster belongs to.
    owner: ModelId,
    /// Agent IDs in sequence order.
    order: Vec<AgentId>,
    /// Agents indexed by their identifier.
    members: BTreeMap<AgentId, A>,
    /// Bumped on every mutation.
    revision: u64,
    /// Revision from which the touch log is complete.
    baseline: u64,
    /// `(revision, agent)` for every mutable borrow after `baseline`.
    touched: Vec<(u64, AgentId)>,
    /// Index of the next agent to visit while a pass is running.
    cursor: Option<usize>,
}

impl<A> Roster<A> {
    /// Create an empty roster under a freshly allocated owner id.
    pub fn new() -> Self {
        Self {
            owner: ModelId::allocate(),
            order: Vec::new(),
            members: BTreeMap::new(),
            revision: 0,
            baseline: 0,
            touched: Vec::new(),
            cursor: None,
        }
    }

    /// Return the owning model's identifier.
    pub const fn owner(&self) -> ModelId {
        self.owner
    }

    /// Return the current revision. Any two observations with equal
    /// revisions saw the same membership and the same agent states.
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Return the number of agents.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Return `true` when the roster holds no agents.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Return `true` if an agent with `id` is a member.
    pub fn contains(&self, id: AgentId) -> bool {
        self.members.contains_key(&id)
    }

    /// Get an agent by identifier.
    pub fn get(&self, id: AgentId) -> Option<&A> {
        self.members.get(&id)
    }

    /// Get an agent mutably by identifier.
    pub fn get_mut(&mut self, id: AgentId) -> Option<&mut A> {
        let agent = self.members.get_mut(&id)?;
        self.revision = self.revision.wrapping_add(1);
        let limit = self.order.len().max(MIN_TOUCH_LOG).saturating_mul(2);
        if self.touched.len() >= limit {
            self.touched.clear();
            self.baseline = self.revision;
        } else {
            self.touched.push((self.revision, id));
        }
        Some(agent)
    }

    /// Return the agents mutably borrowed after `revision`, oldest first and
    /// possibly repeated.
    ///
    /// Returns `None` when the log cannot answer: membership changed after
    /// `revision`, the log was dropped since, or `revision` is in the future.
    pub fn touched_since(&self, revision: u64) -> Option<impl Iterator<Item = AgentId> + '_> {
        if revision < self.baseline || revision > self.revision {
            return None;
        }
        let start = self.touched.partition_point(|&(at, _)| at <= revision);
        let recent = self.touched.get(start..).unwrap_or_default();
        Some(recent.iter().map(|&(_, id)| id))
    }

    /// Get the agent at sequence position `index`.
    pub fn agent_at(&self, index: usize) -> Option<&A> {
        self.order.get(index).and_then(|id| self.members.get(id))
    }

    /// Get the identifier at sequence position `index`.
    pub fn id_at(&self, index: usize) -> Option<AgentId> {
        self.order.get(index).copied()
    }

    /// Return the current sequence position of `id`.
    pub fn index_of(&self, id: AgentId) -> Option<usize> {
        self.order.iter().position(|&member| member == id)
    }

    /// Iterate over agent IDs in sequence order.
    pub fn ids(&self) -> impl ExactSizeIterator<Item = AgentId> + '_ {
        self.order.iter().copied()
    }

    /// Iterate over agents in sequence order.
    pub fn iter(&self) -> impl Iterator<Item = &A> + '_ {
        self.order.iter().filter_map(|id| self.members.get(id))
    }

    /// Start an iteration pass at the front of the sequence.
    pub const fn begin_pass(&mut self) {
        self.cursor = Some(0);
    }

    /// Return the next agent to visit in the running pass, moving the
    /// cursor past it. Returns `None` when the pass is exhausted or no
    /// pass is running.
    pub fn advance(&mut self) -> Option<AgentId> {
        let index = self.cursor?;
        let id = self.order.get(index).copied()?;
        self.cursor = index.checked_add(1);
        Some(id)
    }

    /// Finish the running pass, if any.
    pub const fn end_pass(&mut self) {
        self.cursor = None;
    }
}

impl<A: Agent> Roster<A> {
    /// Append an agent to the end of the sequence and return the new length.
    ///
    /// # Errors
    ///
    /// Returns [`RosterError::DuplicateAgent`] if an agent with the same
    /// identity is already present.
    pub fn push(&mut self, agent: A) -> Result<usize, RosterError> {
        let id = agent.id();
        if self.members.contains_key(&id) {
            return Err(RosterError::DuplicateAgent(id));
        }
        self.members.insert(id, agent);
        self.order.push(id);
        self.reset_touches();
        trace!(owner = %self.owner, agent = %id, len = self.order.len(), "agent pushed");
        Ok(self.order.len())
    }

    /// Remove an agent and return it. Later agents shift down by one.
    ///
    /// # Errors
    ///
    /// Returns [`RosterError::AgentNotFound`] if the agent is not present.
    pub fn remove(&mut self, id: AgentId) -> Result<A, RosterError> {
        let index = self.index_of(id).ok_or(RosterError::AgentNotFound(id))?;
        let agent = self
            .members
            .remove(&id)
            .ok_or(RosterError::AgentNotFound(id))?;
        self.order.remove(index);
        if let Some(cursor) = self.cursor
            && index < cursor
        {
            self.cursor = Some(cursor.saturating_sub(1));
        }
        self.reset_touches();
        trace!(owner = %self.owner, agent = %id, len = self.order.len(), "agent removed");
        Ok(agent)
    }

    fn reset_touches(&mut self) {
        self.revision = self.revision.wrapping_add(1);
        self.baseline = self.revision;
        self.touched.clear();
    }
}

impl<A> Default for Roster<A> {
    fn default() -> Self {
        Self::new()
    }
}
