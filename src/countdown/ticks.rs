use std::future::Future;

use crate::clock::{ClockResult, ClockSource};

////////////////////////////////////////////////////////////////////////////////

/// Outcome of one poll of a tick source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    /// External reading the observation is based on, if any.
    pub timestamp: Option<u64>,

    /// Units elapsed since the previous observation.
    pub elapsed: u64,
}

////////////////////////////////////////////////////////////////////////////////

/// Strategy deciding how much time a single poll accounts for.
pub trait TickSource: 'static {
    /// Establishes the reference point; invoked once before the first poll.
    fn prime(&mut self) -> impl Future<Output = ClockResult<Option<u64>>>;

    fn observe(&mut self) -> impl Future<Output = ClockResult<Observation>>;
}

////////////////////////////////////////////////////////////////////////////////

/// Every poll elapses exactly one unit.
#[derive(Debug, Clone, Copy, Default)]
pub struct WallTicks;

impl TickSource for WallTicks {
    async fn prime(&mut self) -> ClockResult<Option<u64>> {
        Ok(None)
    }

    async fn observe(&mut self) -> ClockResult<Observation> {
        Ok(Observation {
            timestamp: None,
            elapsed: 1,
        })
    }
}

////////////////////////////////////////////////////////////////////////////////

/// Every poll elapses the forward delta of an external clock.
///
/// Readings equal to or behind the last observed one count as a stall and
/// leave the reference point untouched.
#[derive(Debug)]
pub struct ChainTicks<C> {
    clock: C,
    last_observed: Option<u64>,
}

impl<C: ClockSource> ChainTicks<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            last_observed: None,
        }
    }

    pub fn last_observed(&self) -> Option<u64> {
        self.last_observed
    }

    fn advance(&mut self, current: u64) -> u64 {
        let Some(last) = self.last_observed else {
            self.last_observed = Some(current);
            return 0;
        };
        let delta = current.saturating_sub(last);
        if delta > 0 {
            self.last_observed = Some(current);
        }
        delta
    }
}

impl<C: ClockSource> TickSource for ChainTicks<C> {
    async fn prime(&mut self) -> ClockResult<Option<u64>> {
        let current = self.clock.timestamp().await?;
        self.last_observed = Some(current);
        Ok(Some(current))
    }

    async fn observe(&mut self) -> ClockResult<Observation> {
        let current = self.clock.timestamp().await?;
        let elapsed = self.advance(current);
        Ok(Observation {
            timestamp: Some(current),
            elapsed,
        })
    }
}

////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use futures::FutureExt;

    use crate::clock::{ClockResult, ClockSource};

    use super::*;

    ////////////////////////////////////////////////////////////////////////////////

    struct FixedClock(Cell<u64>);

    impl ClockSource for FixedClock {
        async fn timestamp(&self) -> ClockResult<u64> {
            Ok(self.0.get())
        }
    }

    ////////////////////////////////////////////////////////////////////////////////

    #[test]
    fn delta_only_moves_forward() {
        let mut ticks = ChainTicks::new(FixedClock(Cell::new(100)));
        assert_eq!(ticks.prime().now_or_never(), Some(Ok(Some(100))));

        ticks.clock.0.set(107);
        let observation = ticks.observe().now_or_never().unwrap().unwrap();
        assert_eq!(observation.elapsed, 7);
        assert_eq!(ticks.last_observed(), Some(107));

        // reorg-like step back is a stall, the reference point stays
        ticks.clock.0.set(103);
        let observation = ticks.observe().now_or_never().unwrap().unwrap();
        assert_eq!(observation.elapsed, 0);
        assert_eq!(observation.timestamp, Some(103));
        assert_eq!(ticks.last_observed(), Some(107));

        ticks.clock.0.set(110);
        let observation = ticks.observe().now_or_never().unwrap().unwrap();
        assert_eq!(observation.elapsed, 3);
    }

    ////////////////////////////////////////////////////////////////////////////////

    #[test]
    fn unprimed_observation_is_reference() {
        let mut ticks = ChainTicks::new(FixedClock(Cell::new(50)));
        let observation = ticks.observe().now_or_never().unwrap().unwrap();
        assert_eq!(observation.elapsed, 0);
        assert_eq!(ticks.last_observed(), Some(50));
    }

    ////////////////////////////////////////////////////////////////////////////////

    #[test]
    fn wall_ticks_are_unit() {
        let mut ticks = WallTicks;
        assert_eq!(ticks.prime().now_or_never(), Some(Ok(None)));
        let observation = ticks.observe().now_or_never().unwrap().unwrap();
        assert_eq!(observation.elapsed, 1);
        assert_eq!(observation.timestamp, None);
    }
}
