//! Per-axis distance and wrap-around arithmetic.
//!
//! A [`Topology`] is either bounded (plain integer lines on every axis) or
//! periodic (every axis is a ring of `extent` cells starting at `origin`).
//! On a ring the distance between `a` and `b` is
//! `min(|a - b| mod E, E - |a - b| mod E)`.
//!
//! Coordinates are *normalised* before they are bucketed: bounded axes keep
//! raw coordinates, periodic axes map into `[0, extent)`.

use crate::error::WorldError;

/// Ring geometry of a periodic world.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Rings {
    /// Coordinate that normalises to 0 on each axis.
    origin: Vec<i64>,
    /// Number of cells on each axis (all at least 1 and at most `i64::MAX`).
    extent: Vec<u64>,
}

/// Axis geometry of a grid world.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    rings: Option<Rings>,
}

impl Topology {
    /// A topology with no wrap-around on any axis.
    pub const fn bounded() -> Self {
        Self { rings: None }
    }

    /// A periodic topology with the given per-axis origin and extent.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::DimensionMismatch`] if `origin` and `extent`
    /// disagree in length, or [`WorldError::InvalidConfig`] for an extent
    /// outside `1..=i64::MAX`.
    pub fn periodic(origin: Vec<i64>, extent: Vec<u64>) -> Result<Self, WorldError> {
        if origin.len() != extent.len() {
            return Err(WorldError::DimensionMismatch {
                expected: extent.len(),
                actual: origin.len(),
            });
        }
        if let Some(axis) = extent.iter().position(|&e| e == 0 || i64::try_from(e).is_err()) {
            return Err(WorldError::InvalidConfig {
                reason: format!("extent on axis {axis} must be in 1..=i64::MAX"),
            });
        }
        Ok(Self {
            rings: Some(Rings { origin, extent }),
        })
    }

    /// Infer a periodic topology spanning `max - min + 1` cells per axis
    /// over the given points, each of which must have `dimension` axes.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::ArithmeticOverflow`] if a span does not fit in
    /// `i64`, or [`WorldError::InvalidConfig`] when there are no points.
    pub fn infer<'a>(
        points: impl IntoIterator<Item = &'a [i64]>,
        dimension: usize,
    ) -> Result<Self, WorldError> {
        let mut bounds: Option<Vec<(i64, i64)>> = None;
        for point in points {
            let current = bounds.get_or_insert_with(|| point.iter().map(|&c| (c, c)).collect());
            for ((lo, hi), &c) in current.iter_mut().zip(point) {
                *lo = (*lo).min(c);
                *hi = (*hi).max(c);
            }
        }
        let bounds = bounds.ok_or_else(|| WorldError::InvalidConfig {
            reason: "cannot infer extents without any agents".to_owned(),
        })?;
        if bounds.len() != dimension {
            return Err(WorldError::DimensionMismatch {
                expected: dimension,
                actual: bounds.len(),
            });
        }
        let origin = bounds.iter().map(|&(lo, _)| lo).collect();
        let extent = bounds
            .iter()
            .map(|&(lo, hi)| {
                hi.abs_diff(lo)
                    .checked_add(1)
                    .ok_or(WorldError::ArithmeticOverflow)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::periodic(origin, extent)
    }

    /// Return the extent of `axis` for a periodic topology.
    pub fn extent(&self, axis: usize) -> Option<u64> {
        self.rings
            .as_ref()
            .and_then(|rings| rings.extent.get(axis).copied())
    }

    /// Return the number of axes of a periodic topology. Bounded
    /// topologies fit any dimension.
    pub fn dimension(&self) -> Option<usize> {
        self.rings.as_ref().map(|rings| rings.extent.len())
    }

    /// Distance between coordinates `a` and `b` along `axis`.
    pub fn axis_delta(&self, axis: usize, a: i64, b: i64) -> u64 {
        let raw = a.abs_diff(b);
        match self.extent(axis) {
            Some(extent) => {
                let folded = raw.checked_rem(extent).unwrap_or(raw);
                folded.min(extent.saturating_sub(folded))
            }
            None => raw,
        }
    }

    /// Map a raw coordinate on `axis` to the coordinate used for bucketing.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::ArithmeticOverflow`] if the coordinate cannot
    /// be folded onto the ring.
    pub fn normalize(&self, axis: usize, coord: i64) -> Result<i64, WorldError> {
        let Some(rings) = &self.rings else {
            return Ok(coord);
        };
        let (Some(&origin), Some(&extent)) = (rings.origin.get(axis), rings.extent.get(axis))
        else {
            return Err(WorldError::DimensionMismatch {
                expected: rings.extent.len(),
                actual: axis.saturating_add(1),
            });
        };
        let offset = i128::from(coord)
            .checked_sub(i128::from(origin))
            .ok_or(WorldError::ArithmeticOverflow)?;
        let folded = offset
            .checked_rem_euclid(i128::from(extent))
            .ok_or(WorldError::ArithmeticOverflow)?;
        i64::try_from(folded).map_err(|_err| WorldError::ArithmeticOverflow)
    }

    /// Return the inclusive intervals of normalised coordinates on `axis`
    /// that lie within `radius` of the raw coordinate `center`.
    ///
    /// Bounded axes yield one interval (saturated at the `i64` range).
    /// Periodic axes yield one interval, two when the window crosses the
    /// seam, or the whole ring when the window is at least as wide as it.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::ArithmeticOverflow`] if the window cannot be
    /// computed.
    pub fn window(&self, axis: usize, center: i64, radius: u64) -> Result<Vec<(i64, i64)>, WorldError> {
        let Some(extent) = self.extent(axis) else {
            return Ok(vec![(
                center.saturating_sub_unsigned(radius),
                center.saturating_add_unsigned(radius),
            )]);
        };

        let ring = i64::try_from(extent).map_err(|_err| WorldError::ArithmeticOverflow)?;
        let last = ring.checked_sub(1).ok_or(WorldError::ArithmeticOverflow)?;
        let width = u128::from(radius).saturating_mul(2).saturating_add(1);
        if width >= u128::from(extent) {
            return Ok(vec![(0, last)]);
        }

        // Here 2r + 1 < extent, so r fits in i64 and neither end can wrap twice.
        let r = i64::try_from(radius).map_err(|_err| WorldError::ArithmeticOverflow)?;
        let center = self.normalize(axis, center)?;
        let lo = center.checked_sub(r).ok_or(WorldError::ArithmeticOverflow)?;
        let hi = center.checked_add(r).ok_or(WorldError::ArithmeticOverflow)?;

        if lo < 0 {
            let wrapped = lo.checked_add(ring).ok_or(WorldError::ArithmeticOverflow)?;
            Ok(vec![(0, hi), (wrapped, last)])
        } else if hi > last {
            let wrapped = hi.checked_sub(ring).ok_or(WorldError::ArithmeticOverflow)?;
            Ok(vec![(0, wrapped), (lo, last)])
        } else {
            Ok(vec![(lo, hi)])
        }
    }
}
