//! Collaborator traits the acquisition loop is driven through
//!
//! The loop never touches hardware directly. The optical front end, the
//! analog GSR channel and the timestamp source are handed to it as values
//! implementing these traits, so firmware binds them to peripherals and tests
//! bind them to scripted doubles.

mod max30105;

pub use max30105::{MAX30105_ADDRESS, Max30105, Max30105Error};

use crate::config::SensorConfig;

/// One red + infrared reading produced together by the optical sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PairedSample {
    pub red: u32,
    pub ir: u32,
}

impl PairedSample {
    pub const fn new(red: u32, ir: u32) -> Self {
        Self { red, ir }
    }
}

/// Identifier of an analog input channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelId(pub u8);

/// Optical pulse sensor with an internal FIFO of paired samples.
pub trait OpticalSensor {
    /// Failure reported by one-time bring-up
    type Error: core::fmt::Debug;

    /// Bring the sensor up with `config`. Called exactly once.
    fn begin(&mut self, config: &SensorConfig) -> Result<(), Self::Error>;

    /// Non-blocking check for at least one unread paired sample.
    fn is_available(&mut self) -> bool;

    /// Consume the oldest unread paired sample.
    ///
    /// Returns `None` only if called while nothing is available.
    fn pop_sample(&mut self) -> Option<PairedSample>;
}

/// Analog input sampled without averaging or validation.
pub trait AnalogChannel {
    fn read(&mut self, channel: ChannelId) -> i32;
}

/// Monotonic, non-decreasing seconds counter.
pub trait Clock {
    fn now(&mut self) -> u32;
}
