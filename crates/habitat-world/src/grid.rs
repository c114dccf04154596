//! Periodic or bounded N-dimensional grid world.
//!
//! [`GridWorld`] answers [`World::nearby`] from a [`BucketIndex`] cached
//! behind a mutex for one model and bucket size at a time. Between queries
//! the index follows the roster's mutable borrows by re-filing only the
//! agents that moved; adding or removing agents, switching model, or
//! changing bucket size triggers a rebuild.
//!
//! A periodic world without configured extents fixes each model's ring on
//! that model's first non-empty query: `max - min + 1` cells per axis over
//! the agents and the query point. The ring then stays put for the model's
//! lifetime, and later points outside it wrap with plain modulo arithmetic.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use habitat_types::{Agent, AgentId, ModelId, Roster, validate_dimension};
use tracing::debug;

use crate::config::GridConfig;
use crate::error::WorldError;
use crate::index::{BucketIndex, IndexKey};
use crate::topology::Topology;
use crate::world::World;

/// Largest usable bucket edge.
const MAX_BUCKET_SIZE: u64 = i64::MAX.unsigned_abs();

/// State a grid world keeps between queries.
#[derive(Debug, Default)]
struct Cache {
    index: Option<BucketIndex>,
    /// Rings fixed on first use, per model.
    rings: BTreeMap<ModelId, Topology>,
}

/// A grid world with optional wrap-around on every axis.
#[derive(Debug)]
pub struct GridWorld {
    config: GridConfig,
    cache: Mutex<Cache>,
    rebuilds: AtomicU64,
}

impl GridWorld {
    /// Create a grid world whose dimension and extents are fixed by the
    /// first query of each model.
    pub fn new(periodic: bool) -> Self {
        Self::with_config(GridConfig {
            periodic,
            ..GridConfig::default()
        })
    }

    /// Create a grid world from an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidConfig`] if the configuration fails
    /// [`GridConfig::validate`].
    pub fn from_config(config: GridConfig) -> Result<Self, WorldError> {
        config.validate()?;
        Ok(Self::with_config(config))
    }

    fn with_config(config: GridConfig) -> Self {
        Self {
            config,
            cache: Mutex::new(Cache::default()),
            rebuilds: AtomicU64::new(0),
        }
    }

    /// Return the world's configuration.
    pub const fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Return how many times a full index build has run.
    pub fn index_rebuilds(&self) -> u64 {
        self.rebuilds.load(Ordering::Relaxed)
    }

    const fn infers_rings(&self) -> bool {
        self.config.periodic && self.config.extent.is_none()
    }

    fn check_query(&self, position: &[i64]) -> Result<(), WorldError> {
        validate_dimension(position.len()).map_err(|_err| WorldError::InvalidPosition {
            dimension: position.len(),
        })?;
        let fixed = self
            .config
            .dimension
            .or_else(|| self.config.extent.as_ref().map(Vec::len));
        if let Some(expected) = fixed
            && expected != position.len()
        {
            return Err(WorldError::DimensionMismatch {
                expected,
                actual: position.len(),
            });
        }
        Ok(())
    }
}

impl Default for GridWorld {
    fn default() -> Self {
        Self::new(true)
    }
}

impl World for GridWorld {
    type Pos = [i64];

    fn name(&self) -> &'static str {
        "GridWorld"
    }

    fn nearby<A: Agent>(
        &self,
        roster: &Roster<A>,
        position: &[i64],
        radius: u64,
    ) -> Result<Vec<AgentId>, WorldError> {
        self.check_query(position)?;
        if roster.is_empty() {
            return Ok(Vec::new());
        }

        let key = IndexKey {
            owner: roster.owner(),
            bucket_size: self
                .config
                .bucket_size
                .unwrap_or(radius)
                .clamp(1, MAX_BUCKET_SIZE),
        };

        let mut guard = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        let cache = &mut *guard;
        if let Some(index) = cache.index.as_mut().filter(|index| index.key() == key) {
            match index.sync(roster) {
                Ok(true) => return index.query(position, radius, self.config.metric),
                Ok(false) => {}
                Err(err) => {
                    cache.index = None;
                    return Err(err);
                }
            }
        }

        let index = BucketIndex::build(
            roster,
            &self.config,
            key,
            position,
            cache.rings.get(&key.owner),
        )?;
        if self.infers_rings() && !cache.rings.contains_key(&key.owner) {
            debug!(model = %key.owner, topology = ?index.topology(), "Fixed inferred extents");
            cache.rings.insert(key.owner, index.topology().clone());
        }
        self.rebuilds.fetch_add(1, Ordering::Relaxed);
        debug!(
            model = %key.owner,
            revision = roster.revision(),
            agents = index.len(),
            buckets = index.bucket_count(),
            bucket_size = key.bucket_size,
            "Rebuilt grid index"
        );
        let found = index.query(position, radius, self.config.metric)?;
        cache.index = Some(index);
        Ok(found)
    }

    fn release(&self, owner: ModelId) {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        cache.rings.remove(&owner);
        if cache.index.as_ref().is_some_and(|index| index.key().owner == owner) {
            cache.index = None;
        }
    }
}
