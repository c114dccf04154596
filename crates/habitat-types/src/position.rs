//! Fixed-dimension integer grid coordinates.
//!
//! A [`Position`] is a coordinate vector whose dimension is fixed when it is
//! created and must lie in `1..=MAX_DIMENSION`. Coordinates can be edited in
//! place, but the dimension never changes afterwards. Consistency between
//! the positions of different agents is not checked here; the world checks
//! it when it answers a query.

use serde::{Deserialize, Serialize};

use crate::error::PositionError;

/// Largest supported number of axes.
pub const MAX_DIMENSION: usize = 100;

/// Check that `dimension` is a supported number of axes.
///
/// # Errors
///
/// Returns [`PositionError::InvalidDimension`] when `dimension` is zero or
/// larger than [`MAX_DIMENSION`].
pub const fn validate_dimension(dimension: usize) -> Result<(), PositionError> {
    if dimension == 0 || dimension > MAX_DIMENSION {
        return Err(PositionError::InvalidDimension {
            dimension,
            max: MAX_DIMENSION,
        });
    }
    Ok(())
}

/// A point on an N-dimensional integer grid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<i64>", into = "Vec<i64>")]
pub struct Position(Vec<i64>);

impl Position {
    /// Build a position from a coordinate vector.
    ///
    /// # Errors
    ///
    /// Returns [`PositionError::InvalidDimension`] for an empty vector or one
    /// with more than [`MAX_DIMENSION`] axes.
    pub fn new(coords: impl Into<Vec<i64>>) -> Result<Self, PositionError> {
        let coords = coords.into();
        validate_dimension(coords.len())?;
        Ok(Self(coords))
    }

    /// Return the number of axes.
    pub fn dimension(&self) -> usize {
        self.0.len()
    }

    /// Return the coordinates as a slice.
    pub fn coords(&self) -> &[i64] {
        &self.0
    }

    /// Return the coordinate on `axis`, if the axis exists.
    pub fn axis(&self, axis: usize) -> Option<i64> {
        self.0.get(axis).copied()
    }

    /// Shift this position by `delta`, axis by axis.
    ///
    /// The position is left untouched if any axis would overflow.
    ///
    /// # Errors
    ///
    /// Returns [`PositionError::DimensionMismatch`] if `delta` has a different
    /// dimension, or [`PositionError::Overflow`] on coordinate overflow.
    pub fn translate(&mut self, delta: &[i64]) -> Result<(), PositionError> {
        if delta.len() != self.0.len() {
            return Err(PositionError::DimensionMismatch {
                expected: self.0.len(),
                actual: delta.len(),
            });
        }
        let moved = self
            .0
            .iter()
            .zip(delta)
            .enumerate()
            .map(|(axis, (&c, &d))| c.checked_add(d).ok_or(PositionError::Overflow { axis }))
            .collect::<Result<Vec<_>, _>>()?;
        self.0 = moved;
        Ok(())
    }
}

impl TryFrom<Vec<i64>> for Position {
    type Error = PositionError;

    fn try_from(coords: Vec<i64>) -> Result<Self, Self::Error> {
        Self::new(coords)
    }
}

impl<const N: usize> TryFrom<[i64; N]> for Position {
    type Error = PositionError;

    fn try_from(coords: [i64; N]) -> Result<Self, Self::Error> {
        Self::new(coords)
    }
}

impl From<Position> for Vec<i64> {
    fn from(position: Position) -> Self {
        position.0
    }
}

impl AsRef<[i64]> for Position {
    fn as_ref(&self) -> &[i64] {
        &self.0
    }
}

impl core::fmt::Display for Position {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "(")?;
        for (axis, coord) in self.0.iter().enumerate() {
            if axis > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{coord}")?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_position() {
        let result = Position::new(Vec::<i64>::new());
        assert_eq!(
            result,
            Err(PositionError::InvalidDimension {
                dimension: 0,
                max: MAX_DIMENSION
            })
        );
    }

    #[test]
    fn rejects_too_many_axes() {
        let result = Position::new(vec![0_i64; MAX_DIMENSION + 1]);
        assert!(matches!(
            result,
            Err(PositionError::InvalidDimension { dimension: 101, .. })
        ));
        assert!(Position::new(vec![0_i64; MAX_DIMENSION]).is_ok());
    }

    #[test]
    fn translate_moves_every_axis() {
        let mut pos = Position::try_from([1_i64, 2, 3]).unwrap();
        pos.translate(&[1, -2, 0]).unwrap();
        assert_eq!(pos.coords(), &[2, 0, 3]);
    }

    #[test]
    fn translate_rejects_wrong_dimension() {
        let mut pos = Position::try_from([1_i64, 2]).unwrap();
        let result = pos.translate(&[1]);
        assert_eq!(
            result,
            Err(PositionError::DimensionMismatch {
                expected: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn translate_overflow_leaves_position_unchanged() {
        let mut pos = Position::try_from([0_i64, i64::MAX]).unwrap();
        let result = pos.translate(&[5, 1]);
        assert_eq!(result, Err(PositionError::Overflow { axis: 1 }));
        assert_eq!(pos.coords(), &[0, i64::MAX]);
    }

    #[test]
    fn display_lists_coordinates() {
        let pos = Position::try_from([3_i64, -4]).unwrap();
        assert_eq!(pos.to_string(), "(3, -4)");
    }

    #[test]
    fn serde_rejects_empty_vector() {
        let restored: Result<Position, _> = serde_json::from_str("[]");
        assert!(restored.is_err());
        let restored: Position = serde_json::from_str("[7,8]").unwrap();
        assert_eq!(restored.axis(1), Some(8));
    }
}
