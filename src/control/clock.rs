use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

///
/// A source of monotonic timestamps, measured from an arbitrary fixed origin.
/// Controllers take the clock as a parameter so tests can step time by hand.
///
pub trait Clock {
    fn now(&self) -> Duration;
}

///
/// The system's monotonic clock, measured from when the clock was created.
///
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> MonotonicClock {
        MonotonicClock { origin: Instant::now() }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        MonotonicClock::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

///
/// A clock which only moves when told to. Clones share the same time, so one
/// handle can drive every controller in a simulation.
///
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> ManualClock {
        ManualClock::default()
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    ///
    /// Jumps to an absolute time. Moving backwards is allowed, to exercise
    /// non-monotonic clock handling.
    ///
    pub fn set(&self, to: Duration) {
        self.now.set(to);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}
