//! Model time.
//!
//! The clock counts completed ticks. It starts at 0 and only moves forward,
//! one tick at a time, with checked arithmetic.

use crate::error::ModelError;

/// Tick counter of a model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Clock {
    /// Current tick number (0 before the first step).
    tick: u64,
}

impl Clock {
    /// Create a clock at tick 0.
    pub const fn new() -> Self {
        Self { tick: 0 }
    }

    /// Advance the clock by one tick. Returns the new tick number.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::TickOverflow`] if the tick counter would exceed
    /// `u64::MAX`. The clock is left unchanged.
    pub fn advance(&mut self) -> Result<u64, ModelError> {
        self.tick = self.tick.checked_add(1).ok_or(ModelError::TickOverflow)?;
        Ok(self.tick)
    }

    /// Return the current tick number.
    pub const fn tick(&self) -> u64 {
        self.tick
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_zero() {
        assert_eq!(Clock::new().tick(), 0);
        assert_eq!(Clock::default(), Clock::new());
    }

    #[test]
    fn advance_increments_by_one() {
        let mut clock = Clock::new();
        assert_eq!(clock.advance().unwrap(), 1);
        assert_eq!(clock.advance().unwrap(), 2);
        assert_eq!(clock.tick(), 2);
    }

    #[test]
    fn overflow_leaves_clock_unchanged() {
        let mut clock = Clock { tick: u64::MAX };
        assert_eq!(clock.advance(), Err(ModelError::TickOverflow));
        assert_eq!(clock.tick(), u64::MAX);
    }
}
