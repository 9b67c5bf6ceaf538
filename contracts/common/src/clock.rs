//! Tick source
//!
//! All deadlines are tick counts. The host supplies ticks through [`Clock`];
//! the protocol never blocks waiting for time to pass.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::errors::{TBondError, TBondResult};
use crate::types::Tick;

/// Monotonically non-decreasing tick source
pub trait Clock {
    /// Current tick
    fn current_tick(&self) -> Tick;
}

/// Caller-driven clock for hosts and tests
#[derive(Debug, Default)]
pub struct ManualClock {
    tick: AtomicU64,
}

impl ManualClock {
    /// Create a clock starting at `tick`
    pub fn new(tick: Tick) -> Self {
        Self {
            tick: AtomicU64::new(tick),
        }
    }

    /// Move forward by `ticks`, returning the new tick
    pub fn advance(&self, ticks: Tick) -> TBondResult<Tick> {
        let now = self.current_tick();
        let next = now.checked_add(ticks).ok_or(TBondError::Overflow)?;
        self.tick.store(next, Ordering::SeqCst);
        Ok(next)
    }

    /// Jump to `tick`; moving backwards is rejected
    pub fn advance_to(&self, tick: Tick) -> TBondResult<()> {
        let now = self.current_tick();
        if tick < now {
            return Err(TBondError::InvalidInput {
                param: "tick",
                reason: "clock cannot move backwards",
            });
        }
        self.tick.store(tick, Ordering::SeqCst);
        Ok(())
    }
}

impl Clock for ManualClock {
    fn current_tick(&self) -> Tick {
        self.tick.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new(5);
        assert_eq!(clock.current_tick(), 5);
        assert_eq!(clock.advance(10).unwrap(), 15);
        clock.advance_to(20).unwrap();
        assert_eq!(clock.current_tick(), 20);
        assert!(clock.advance_to(19).is_err());
        assert_eq!(clock.current_tick(), 20);
    }
}
