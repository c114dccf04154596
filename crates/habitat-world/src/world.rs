//! The spatial world contract.

use habitat_types::{Agent, AgentId, ModelId, Roster};

use crate::error::WorldError;

/// A topology that can answer proximity queries over a model's agents.
///
/// Anything an implementation keeps between calls has to be keyed to the
/// [`Roster::owner`] it was derived from, and checked against
/// [`Roster::revision`] before use, so a world shared between models never
/// answers one model's query from another model's agents.
pub trait World {
    /// The coordinate type queries are expressed in.
    type Pos: ?Sized;

    /// Return the concrete world type's name, used in model summaries.
    fn name(&self) -> &'static str;

    /// Return the IDs of every agent in `roster` within `radius` (inclusive)
    /// of `position`. The order of the result carries no meaning.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError`] when the query position or any agent fails the
    /// world's preconditions.
    fn nearby<A: Agent>(
        &self,
        roster: &Roster<A>,
        position: &Self::Pos,
        radius: u64,
    ) -> Result<Vec<AgentId>, WorldError>;

    /// Drop everything kept for the model `owner`. Called when the model
    /// goes away.
    fn release(&self, _owner: ModelId) {}
}
