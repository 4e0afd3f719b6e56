use std::time::{Duration, Instant};

/// A monotonic time source used to measure the phases of a batch.
pub trait Clock {
    /// Returns the time elapsed since an arbitrary, fixed origin.
    fn now(&self) -> Duration;
}

/// A `Clock` backed by `Instant`.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}
