use std::{thread, time::Duration};

/// Decides how long to wait before each batch.
///
/// Pacing exists so that per batch telemetry can be followed by a human, it does not apply
/// any backpressure.
pub trait Pacer {
    fn pace(&mut self);
}

/// Never waits.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDelay;

impl Pacer for NoDelay {
    fn pace(&mut self) {}
}

/// Sleeps the current thread for a fixed amount of time.
#[derive(Debug, Clone, Copy)]
pub struct FixedDelay(pub Duration);

impl Pacer for FixedDelay {
    fn pace(&mut self) {
        if !self.0.is_zero() {
            thread::sleep(self.0);
        }
    }
}
