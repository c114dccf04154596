//! Uniform bucket index for neighbor sweeps.
//!
//! The index splits normalised space into cubic buckets of edge
//! `bucket_size` and files every agent under the bucket containing it:
//! `floor(normalised[i] / bucket_size)` on each axis. A query only visits
//! buckets overlapping the window `[p - r, p + r]` on every axis, then
//! applies the exact metric to the agents found there.
//!
//! Two guards keep a sweep bounded by the population even for huge radii:
//! windows are clipped to the range of occupied buckets, and when the
//! clipped window still holds more cells than there are occupied buckets,
//! the sweep walks the occupied buckets instead of the window.
//!
//! An index is built for one model and bucket size (its [`IndexKey`]) and
//! remembers the roster revision it reflects. When the roster has only
//! handed out mutable borrows since then, [`BucketIndex::sync`] re-files the
//! borrowed agents that actually moved; any membership change calls for a
//! fresh build.

use std::collections::BTreeMap;

use habitat_types::{Agent, AgentId, ModelId, Roster};

use crate::config::{GridConfig, Metric};
use crate::error::WorldError;
use crate::topology::Topology;

/// Identifies what an index was built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexKey {
    /// Model whose roster was indexed.
    pub owner: ModelId,
    /// Bucket edge length.
    pub bucket_size: u64,
}

/// An indexed agent.
#[derive(Debug, Clone)]
struct Entry {
    id: AgentId,
    coords: Vec<i64>,
}

/// Agents filed into uniform buckets.
#[derive(Debug, Clone)]
pub struct BucketIndex {
    key: IndexKey,
    /// Roster revision the index reflects.
    revision: u64,
    dimension: usize,
    topology: Topology,
    bucket_size: i64,
    entries: Vec<Entry>,
    slots: BTreeMap<AgentId, usize>,
    buckets: BTreeMap<Vec<i64>, Vec<usize>>,
    /// Bounds on the occupied bucket coordinates per axis. Never shrinks
    /// between builds.
    occupied: Vec<(i64, i64)>,
}

impl BucketIndex {
    /// Validate every agent in `roster` and index it.
    ///
    /// A periodic world without configured extents uses `inferred` when
    /// given, and otherwise infers a ring from the agents and the query
    /// point `position`.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::IncompatibleAgent`] for an agent without a
    /// position, [`WorldError::DimensionMismatch`] when agents disagree with
    /// the first agent, the query point, the configured dimension/extent or
    /// the inferred ring, and [`WorldError::InvalidConfig`] for an empty
    /// roster or a bucket size outside `1..=i64::MAX`.
    pub fn build<A: Agent>(
        roster: &Roster<A>,
        config: &GridConfig,
        key: IndexKey,
        position: &[i64],
        inferred: Option<&Topology>,
    ) -> Result<Self, WorldError> {
        let mut entries = Vec::with_capacity(roster.len());
        let mut slots = BTreeMap::new();
        let mut dimension = None;
        for agent in roster.iter() {
            let at = agent
                .position()
                .ok_or_else(|| WorldError::IncompatibleAgent(agent.id()))?;
            let expected = *dimension.get_or_insert(at.dimension());
            if at.dimension() != expected {
                return Err(WorldError::DimensionMismatch {
                    expected,
                    actual: at.dimension(),
                });
            }
            slots.insert(agent.id(), entries.len());
            entries.push(Entry {
                id: agent.id(),
                coords: at.coords().to_vec(),
            });
        }
        let dimension = dimension.ok_or_else(|| WorldError::InvalidConfig {
            reason: "cannot index an empty roster".to_owned(),
        })?;

        if position.len() != dimension {
            return Err(WorldError::DimensionMismatch {
                expected: dimension,
                actual: position.len(),
            });
        }
        if let Some(configured) = config.dimension
            && configured != dimension
        {
            return Err(WorldError::DimensionMismatch {
                expected: configured,
                actual: dimension,
            });
        }

        let topology = match (&config.extent, config.periodic, inferred) {
            (_, false, _) => Topology::bounded(),
            (Some(extent), true, _) => {
                if extent.len() != dimension {
                    return Err(WorldError::DimensionMismatch {
                        expected: extent.len(),
                        actual: dimension,
                    });
                }
                Topology::periodic(vec![0; dimension], extent.clone())?
            }
            (None, true, Some(known)) => {
                if let Some(fixed) = known.dimension()
                    && fixed != dimension
                {
                    return Err(WorldError::DimensionMismatch {
                        expected: fixed,
                        actual: dimension,
                    });
                }
                known.clone()
            }
            (None, true, None) => Topology::infer(
                entries
                    .iter()
                    .map(|e| e.coords.as_slice())
                    .chain(std::iter::once(position)),
                dimension,
            )?,
        };

        let bucket_size = i64::try_from(key.bucket_size)
            .ok()
            .filter(|&s| s > 0)
            .ok_or_else(|| WorldError::InvalidConfig {
                reason: format!("bucket size {} out of range", key.bucket_size),
            })?;

        let mut index = Self {
            key,
            revision: roster.revision(),
            dimension,
            topology,
            bucket_size,
            entries: Vec::new(),
            slots,
            buckets: BTreeMap::new(),
            occupied: Vec::new(),
        };
        for (slot, entry) in entries.iter().enumerate() {
            let cell = index.cell_of(&entry.coords)?;
            index.widen(&cell);
            index.buckets.entry(cell).or_default().push(slot);
        }
        index.entries = entries;
        Ok(index)
    }

    /// Bring the index up to date with `roster` by re-filing the agents
    /// borrowed mutably since the last build or sync.
    ///
    /// Returns `Ok(false)` when the roster changed in a way only a fresh
    /// build can follow (membership changed, or the touch log was dropped).
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::IncompatibleAgent`] or
    /// [`WorldError::DimensionMismatch`] when a borrowed agent no longer
    /// satisfies the index. The index must be discarded in that case.
    pub fn sync<A: Agent>(&mut self, roster: &Roster<A>) -> Result<bool, WorldError> {
        if roster.owner() != self.key.owner {
            return Ok(false);
        }
        if roster.revision() == self.revision {
            return Ok(true);
        }
        let Some(touched) = roster.touched_since(self.revision) else {
            return Ok(false);
        };
        for id in touched {
            let (Some(agent), Some(&slot)) = (roster.get(id), self.slots.get(&id)) else {
                return Ok(false);
            };
            let position = agent.position().ok_or(WorldError::IncompatibleAgent(id))?;
            if position.dimension() != self.dimension {
                return Err(WorldError::DimensionMismatch {
                    expected: self.dimension,
                    actual: position.dimension(),
                });
            }
            self.refile(slot, position.coords())?;
        }
        self.revision = roster.revision();
        Ok(true)
    }

    /// Move the agent in `slot` to `coords`, changing buckets if needed.
    fn refile(&mut self, slot: usize, coords: &[i64]) -> Result<(), WorldError> {
        let Some(entry) = self.entries.get(slot) else {
            return Ok(());
        };
        if entry.coords == coords {
            return Ok(());
        }
        let old = self.cell_of(&entry.coords)?;
        let new = self.cell_of(coords)?;
        if let Some(entry) = self.entries.get_mut(slot) {
            entry.coords = coords.to_vec();
        }
        if old != new {
            let emptied = self.buckets.get_mut(&old).is_some_and(|members| {
                members.retain(|&member| member != slot);
                members.is_empty()
            });
            if emptied {
                self.buckets.remove(&old);
            }
            self.widen(&new);
            self.buckets.entry(new).or_default().push(slot);
        }
        Ok(())
    }

    /// Bucket coordinates of a raw point.
    fn cell_of(&self, coords: &[i64]) -> Result<Vec<i64>, WorldError> {
        coords
            .iter()
            .enumerate()
            .map(|(axis, &c)| bucket_of(self.topology.normalize(axis, c)?, self.bucket_size))
            .collect()
    }

    /// Extend the occupied bounds to cover `cell`.
    fn widen(&mut self, cell: &[i64]) {
        if self.occupied.is_empty() {
            self.occupied = cell.iter().map(|&b| (b, b)).collect();
            return;
        }
        for ((lo, hi), &b) in self.occupied.iter_mut().zip(cell) {
            *lo = (*lo).min(b);
            *hi = (*hi).max(b);
        }
    }

    /// Return the key this index was built from.
    pub const fn key(&self) -> IndexKey {
        self.key
    }

    /// Return the topology the index was built with.
    pub const fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Return the number of indexed agents.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return the number of non-empty buckets.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Return every indexed agent within `radius` of `position` under
    /// `metric`.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::DimensionMismatch`] if `position` does not have
    /// the indexed dimension.
    pub fn query(
        &self,
        position: &[i64],
        radius: u64,
        metric: Metric,
    ) -> Result<Vec<AgentId>, WorldError> {
        if position.len() != self.dimension {
            return Err(WorldError::DimensionMismatch {
                expected: self.dimension,
                actual: position.len(),
            });
        }

        let mut windows: Vec<Vec<(i64, i64)>> = Vec::with_capacity(self.dimension);
        for (axis, (&center, &(lo_occupied, hi_occupied))) in
            position.iter().zip(&self.occupied).enumerate()
        {
            let mut cells = Vec::new();
            for (lo, hi) in self.topology.window(axis, center, radius)? {
                let lo = bucket_of(lo, self.bucket_size)?.max(lo_occupied);
                let hi = bucket_of(hi, self.bucket_size)?.min(hi_occupied);
                if lo <= hi {
                    cells.push((lo, hi));
                }
            }
            let cells = merge(cells);
            if cells.is_empty() {
                return Ok(Vec::new());
            }
            windows.push(cells);
        }

        let mut found = Vec::new();
        let mut visit = |slots: &[usize]| {
            for entry in slots.iter().filter_map(|&slot| self.entries.get(slot)) {
                if self.is_within(entry, position, radius, metric) {
                    found.push(entry.id);
                }
            }
        };

        let cell_count = windows.iter().fold(1_u128, |acc, w| {
            acc.saturating_mul(w.iter().map(|&(lo, hi)| span(lo, hi)).sum::<u128>())
        });
        let bucket_count = u128::try_from(self.buckets.len()).unwrap_or(u128::MAX);

        if cell_count > bucket_count {
            for (cell, slots) in &self.buckets {
                let inside = cell.iter().zip(&windows).all(|(&b, window)| {
                    window.iter().any(|&(lo, hi)| lo <= b && b <= hi)
                });
                if inside {
                    visit(slots);
                }
            }
        } else {
            let axes: Vec<Vec<i64>> = windows
                .iter()
                .map(|window| window.iter().flat_map(|&(lo, hi)| lo..=hi).collect())
                .collect();
            for_each_cell(&axes, |cell| {
                if let Some(slots) = self.buckets.get(cell) {
                    visit(slots);
                }
            });
        }

        Ok(found)
    }

    fn is_within(&self, entry: &Entry, position: &[i64], radius: u64, metric: Metric) -> bool {
        let deltas = entry
            .coords
            .iter()
            .zip(position)
            .enumerate()
            .map(|(axis, (&a, &b))| self.topology.axis_delta(axis, a, b));
        metric.within(deltas, radius)
    }
}

/// Bucket coordinate of a normalised coordinate.
fn bucket_of(coord: i64, bucket_size: i64) -> Result<i64, WorldError> {
    coord
        .checked_div_euclid(bucket_size)
        .ok_or(WorldError::ArithmeticOverflow)
}

/// Number of cells in the inclusive range `lo..=hi`.
fn span(lo: i64, hi: i64) -> u128 {
    u128::from(hi.abs_diff(lo)).saturating_add(1)
}

/// Sort and coalesce overlapping or touching inclusive ranges.
fn merge(mut ranges: Vec<(i64, i64)>) -> Vec<(i64, i64)> {
    ranges.sort_unstable();
    let mut merged: Vec<(i64, i64)> = Vec::with_capacity(ranges.len());
    for (lo, hi) in ranges {
        match merged.last_mut() {
            Some(last) if lo <= last.1.saturating_add(1) => last.1 = last.1.max(hi),
            _ => merged.push((lo, hi)),
        }
    }
    merged
}

/// Call `visit` once for every point of the Cartesian product of `axes`.
fn for_each_cell(axes: &[Vec<i64>], mut visit: impl FnMut(&[i64])) {
    let mut cell: Vec<i64> = Vec::with_capacity(axes.len());
    for values in axes {
        let Some(&first) = values.first() else {
            return;
        };
        cell.push(first);
    }
    let mut digits = vec![0_usize; axes.len()];

    loop {
        visit(&cell);

        // Odometer increment, least significant axis first.
        let mut axis = 0;
        loop {
            let (Some(values), Some(digit), Some(slot)) =
                (axes.get(axis), digits.get_mut(axis), cell.get_mut(axis))
            else {
                return;
            };
            *digit = digit.saturating_add(1);
            if let Some(&next) = values.get(*digit) {
                *slot = next;
                break;
            }
            *digit = 0;
            if let Some(&first) = values.first() {
                *slot = first;
            }
            axis = axis.saturating_add(1);
        }
    }
}
