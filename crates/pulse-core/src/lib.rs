//! Hardware-independent core library for the pulse biosignal logger
//!
//! This crate contains the acquisition logic that turns an optical pulse
//! sensor (paired red/IR readings) and an analog skin-conductance channel
//! into a single ordered stream of `timestamp,red,ir,gsr` lines: the record
//! type, the sample ring buffer, the line emitter, the acquisition state
//! machine, the collaborator traits it is driven through, and a MAX30105
//! driver written against `embedded-hal`.
//!
//! It is `#![no_std]` so it compiles on both embedded targets (ESP32-S3) and
//! desktop hosts (for the simulator and tests).

#![no_std]

#[cfg(test)]
extern crate std;

pub mod acquisition;
pub mod config;
pub mod emitter;
pub mod record;
pub mod sensors;
pub mod storage;

#[cfg(test)]
pub(crate) mod mock;

pub use acquisition::{
    AcquisitionError, AcquisitionLoop, AcquisitionState, AcquisitionStats, BusyWait,
    PollOutcome, PollStrategy, SpinLimit,
};
pub use config::{AcquisitionConfig, ClockOrigin, SensorConfig};
pub use emitter::RecordEmitter;
pub use record::Record;
pub use sensors::{
    AnalogChannel, ChannelId, Clock, MAX30105_ADDRESS, Max30105, Max30105Error, OpticalSensor,
    PairedSample,
};
pub use storage::{DEFAULT_BUFFER_CAPACITY, SampleBuffer, SampleWidth, SampleWord};
