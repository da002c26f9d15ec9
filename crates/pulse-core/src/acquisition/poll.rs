//! How the loop waits for the optical sensor to produce a sample

use crate::sensors::OpticalSensor;

/// Result of one wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// A paired sample can be popped
    Ready,
    /// The strategy stopped waiting; the sample is still outstanding
    GaveUp,
}

/// Strategy used while the loop sits in `WaitingForSample`.
///
/// Giving up never surfaces as an error: the loop stays in
/// `WaitingForSample` and calls the strategy again on the next step.
pub trait PollStrategy {
    fn wait_for_sample<S: OpticalSensor>(&mut self, sensor: &mut S) -> PollOutcome;
}

/// Spin on `is_available` with no delay and no attempt limit.
///
/// If the sensor stops producing data this never returns.
#[derive(Debug, Clone, Copy, Default)]
pub struct BusyWait;

impl PollStrategy for BusyWait {
    fn wait_for_sample<S: OpticalSensor>(&mut self, sensor: &mut S) -> PollOutcome {
        while !sensor.is_available() {
            core::hint::spin_loop();
        }
        PollOutcome::Ready
    }
}

/// Spin at most `max_attempts` times per wait.
///
/// Hands control back to the caller between bursts (to feed a watchdog, or
/// to bound a test), without changing what gets emitted.
#[derive(Debug, Clone, Copy)]
pub struct SpinLimit {
    max_attempts: u32,
}

impl SpinLimit {
    pub const fn new(max_attempts: u32) -> Self {
        Self { max_attempts }
    }

    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

impl PollStrategy for SpinLimit {
    fn wait_for_sample<S: OpticalSensor>(&mut self, sensor: &mut S) -> PollOutcome {
        for _ in 0..self.max_attempts {
            if sensor.is_available() {
                return PollOutcome::Ready;
            }
            core::hint::spin_loop();
        }
        PollOutcome::GaveUp
    }
}
