//! Grid world configuration and distance metrics.
//!
//! [`GridConfig`] mirrors the `world` section of `habitat.yaml`. Every field
//! has a default, so an empty section yields a periodic grid whose
//! dimension and extents each model fixes with its first query.

use habitat_types::validate_dimension;
use serde::{Deserialize, Serialize};

use crate::error::WorldError;

/// How the distance between two grid points is measured.
///
/// All metrics are evaluated on per-axis differences, which are already
/// wrapped for periodic worlds. Every non-default metric's ball lies inside
/// the Chebyshev box of the same radius, so one bucket sweep serves all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// Largest per-axis difference: a point is nearby iff it lies in the
    /// axis-aligned box of half-width `r` around the query.
    #[default]
    Chebyshev,
    /// Sum of per-axis differences.
    Manhattan,
    /// Straight-line distance, compared in squared form.
    Euclidean,
}

impl Metric {
    /// Return `true` if a point with the given per-axis differences lies
    /// within `radius` (inclusive).
    pub fn within(self, deltas: impl IntoIterator<Item = u64>, radius: u64) -> bool {
        match self {
            Self::Chebyshev => deltas.into_iter().all(|d| d <= radius),
            Self::Manhattan => {
                let total = deltas
                    .into_iter()
                    .fold(0_u128, |acc, d| acc.saturating_add(u128::from(d)));
                total <= u128::from(radius)
            }
            Self::Euclidean => {
                let total = deltas.into_iter().fold(0_u128, |acc, d| {
                    let d = u128::from(d);
                    acc.saturating_add(d.saturating_mul(d))
                });
                let r = u128::from(radius);
                total <= r.saturating_mul(r)
            }
        }
    }
}

/// Configuration for a [`GridWorld`].
///
/// [`GridWorld`]: crate::grid::GridWorld
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridConfig {
    /// Whether every axis wraps around (toroidal topology).
    #[serde(default = "default_true")]
    pub periodic: bool,

    /// Fixed number of axes. Inferred from the first agent when absent.
    #[serde(default)]
    pub dimension: Option<usize>,

    /// Per-axis size of a periodic world. When absent, each axis spans
    /// `max - min + 1` over the agents' coordinates.
    #[serde(default)]
    pub extent: Option<Vec<u64>>,

    /// Edge length of an index bucket. Defaults to the query radius.
    #[serde(default)]
    pub bucket_size: Option<u64>,

    /// Distance metric used to decide membership.
    #[serde(default)]
    pub metric: Metric,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            periodic: true,
            dimension: None,
            extent: None,
            bucket_size: None,
            metric: Metric::default(),
        }
    }
}

impl GridConfig {
    /// Check the configuration for values that can never be honoured.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidConfig`] for an unsupported dimension, a
    /// zero-sized or out-of-range extent, an extent that disagrees with the
    /// configured dimension, or a zero bucket size.
    pub fn validate(&self) -> Result<(), WorldError> {
        if let Some(dimension) = self.dimension {
            validate_dimension(dimension).map_err(|e| WorldError::InvalidConfig {
                reason: e.to_string(),
            })?;
        }

        if let Some(extent) = &self.extent {
            validate_dimension(extent.len()).map_err(|e| WorldError::InvalidConfig {
                reason: format!("extent: {e}"),
            })?;
            if let Some(dimension) = self.dimension
                && dimension != extent.len()
            {
                return Err(WorldError::InvalidConfig {
                    reason: format!(
                        "extent has {} axes but dimension is {dimension}",
                        extent.len()
                    ),
                });
            }
            if let Some(axis) = extent.iter().position(|&e| e == 0 || i64::try_from(e).is_err()) {
                return Err(WorldError::InvalidConfig {
                    reason: format!("extent on axis {axis} must be in 1..=i64::MAX"),
                });
            }
        }

        if self.bucket_size == Some(0) {
            return Err(WorldError::InvalidConfig {
                reason: "bucket_size must be at least 1".to_owned(),
            });
        }

        Ok(())
    }
}

const fn default_true() -> bool {
    true
}
