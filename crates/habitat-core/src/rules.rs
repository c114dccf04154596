//! Per-tick update rules.
//!
//! A [`StepRules`] value bundles the two optional callbacks a model runs on
//! every tick and the order they run in. The agent callback receives the
//! [`AgentId`] of the agent being visited together with the model, and
//! reaches the agent itself through [`Model::get_mut`].
//!
//! [`Model::get_mut`]: crate::model::Model::get_mut

use std::fmt;

use habitat_types::AgentId;

use crate::error::ModelError;
use crate::model::Model;

/// Callback run once per agent per tick.
pub type AgentStep<A, W> = Box<dyn FnMut(AgentId, &mut Model<A, W>) -> Result<(), ModelError>>;

/// Callback run once per tick for the whole model.
pub type ModelStep<A, W> = Box<dyn FnMut(&mut Model<A, W>) -> Result<(), ModelError>>;

/// The update rule of a model.
pub struct StepRules<A, W> {
    pub(crate) agent_step: Option<AgentStep<A, W>>,
    pub(crate) model_step: Option<ModelStep<A, W>>,
    pub(crate) agents_first: bool,
}

impl<A, W> StepRules<A, W> {
    /// Create an empty rule set that runs agents before the model.
    ///
    /// At least one callback must be added before the rules can build a
    /// model.
    pub const fn new() -> Self {
        Self {
            agent_step: None,
            model_step: None,
            agents_first: true,
        }
    }

    /// Set the per-agent callback.
    #[must_use]
    pub fn agent_step(
        mut self,
        step: impl FnMut(AgentId, &mut Model<A, W>) -> Result<(), ModelError> + 'static,
    ) -> Self {
        self.agent_step = Some(Box::new(step));
        self
    }

    /// Set the per-model callback.
    #[must_use]
    pub fn model_step(
        mut self,
        step: impl FnMut(&mut Model<A, W>) -> Result<(), ModelError> + 'static,
    ) -> Self {
        self.model_step = Some(Box::new(step));
        self
    }

    /// Choose whether the agent pass runs before (`true`, the default) or
    /// after the model callback.
    #[must_use]
    pub const fn agents_first(mut self, agents_first: bool) -> Self {
        self.agents_first = agents_first;
        self
    }

    /// Return `true` if neither callback is set.
    pub const fn is_empty(&self) -> bool {
        self.agent_step.is_none() && self.model_step.is_none()
    }
}

impl<A, W> Default for StepRules<A, W> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A, W> fmt::Debug for StepRules<A, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepRules")
            .field("agent_step", &self.agent_step.is_some())
            .field("model_step", &self.model_step.is_some())
            .field("agents_first", &self.agents_first)
            .finish()
    }
}
