//! Process-wide model registry.
//!
//! Every live [`Model`] records its display name and the name of its world
//! here under its [`ModelId`], so diagnostics can describe a model from its
//! ID alone. The entry is removed by [`Model::dispose`] or, failing that,
//! when the model is dropped.
//!
//! The registry is bookkeeping only. Nothing in the scheduling or query
//! paths reads it.
//!
//! [`Model`]: crate::model::Model
//! [`Model::dispose`]: crate::model::Model::dispose

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use habitat_types::ModelId;
use serde::Serialize;

/// What the registry knows about a live model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Registration {
    /// Display name of the model.
    pub model: String,
    /// Name of the world the model queries.
    pub world: &'static str,
}

static REGISTRY: Mutex<BTreeMap<ModelId, Registration>> = Mutex::new(BTreeMap::new());

/// Record a model. Replaces any previous entry for the same ID.
pub(crate) fn register(id: ModelId, model: String, world: &'static str) {
    REGISTRY
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(id, Registration { model, world });
}

/// Remove a model's entry. Returns `true` if an entry was present.
pub(crate) fn release(id: ModelId) -> bool {
    REGISTRY
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .remove(&id)
        .is_some()
}

/// Look up a live model by ID.
pub fn lookup(id: ModelId) -> Option<Registration> {
    REGISTRY
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&id)
        .cloned()
}

/// Return the IDs of every registered model, in ascending order.
pub fn live_models() -> Vec<ModelId> {
    REGISTRY
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .keys()
        .copied()
        .collect()
}
