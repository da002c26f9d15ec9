//! The acquisition state machine
//!
//! Drives the per-sample cycle: wait for the optical sensor, pop one paired
//! reading, stamp it, sample the GSR channel, store the assembled record in
//! the ring buffer and write it to the host.
//!
//! ```text
//! Uninitialized ──begin ok──▶ WaitingForSample ◀──emitted── SampleReady
//!       │                       │    ▲                         ▲
//!   begin failed                └────┘ not yet                 │
//!       ▼                       └──────────available───────────┘
//!    Halted
//! ```
//!
//! Collaborators are owned by the loop and injected at construction, so the
//! firmware hands it real peripherals and tests hand it scripted doubles.

mod poll;

pub use poll::*;

use embedded_io::Write;
use log::{debug, error, info, trace, warn};
use thiserror_no_std::Error;

use crate::config::AcquisitionConfig;
use crate::emitter::{HEADER, RecordEmitter};
use crate::record::Record;
use crate::sensors::{AnalogChannel, Clock, OpticalSensor};
use crate::storage::{DEFAULT_BUFFER_CAPACITY, SampleBuffer};

/// Line written to the host when the optical sensor cannot be brought up
pub const SENSOR_NOT_FOUND: &str = "MAX30105 was not found. Please check wiring/power.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionState {
    Uninitialized,
    WaitingForSample,
    SampleReady,
    /// Terminal; entered only when initialization fails
    Halted,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionError {
    #[error("Optical sensor failed to initialize")]
    SensorInit,
    #[error("Acquisition halted after a failed initialization")]
    Halted,
}

/// Counters kept by the loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AcquisitionStats {
    /// Records assembled and stored
    pub records: u64,
    /// Full passes over the sample buffer
    pub cycles: u64,
    /// Waits the poll strategy gave up on
    pub stalls: u64,
    /// Record lines the host channel rejected
    pub write_failures: u64,
}

pub struct AcquisitionLoop<S, A, C, W, P = BusyWait, const N: usize = DEFAULT_BUFFER_CAPACITY> {
    sensor: S,
    analog: A,
    clock: C,
    emitter: RecordEmitter<W>,
    poll: P,
    buffer: SampleBuffer<N>,
    config: AcquisitionConfig,
    state: AcquisitionState,
    stats: AcquisitionStats,
}

impl<S, A, C, W, const N: usize> AcquisitionLoop<S, A, C, W, BusyWait, N>
where
    S: OpticalSensor,
    A: AnalogChannel,
    C: Clock,
    W: Write,
{
    /// Create a loop that busy-waits on the sensor with no timeout.
    pub fn new(sensor: S, analog: A, clock: C, host: W, config: AcquisitionConfig) -> Self {
        Self::with_poll_strategy(sensor, analog, clock, host, config, BusyWait)
    }
}

impl<S, A, C, W, P, const N: usize> AcquisitionLoop<S, A, C, W, P, N>
where
    S: OpticalSensor,
    A: AnalogChannel,
    C: Clock,
    W: Write,
    P: PollStrategy,
{
    pub fn with_poll_strategy(
        sensor: S,
        analog: A,
        clock: C,
        host: W,
        config: AcquisitionConfig,
        poll: P,
    ) -> Self {
        Self {
            sensor,
            analog,
            clock,
            emitter: RecordEmitter::new(host),
            poll,
            buffer: SampleBuffer::new(),
            config,
            state: AcquisitionState::Uninitialized,
            stats: AcquisitionStats::default(),
        }
    }

    /// Bring up the optical sensor.
    ///
    /// On failure the diagnostic line is written once and the loop halts for
    /// good; calling this again returns `AcquisitionError::Halted` without
    /// touching the sensor or the host. Once initialized this is a no-op.
    pub fn initialize(&mut self) -> Result<(), AcquisitionError> {
        match self.state {
            AcquisitionState::Uninitialized => {}
            AcquisitionState::Halted => return Err(AcquisitionError::Halted),
            _ => return Ok(()),
        }

        if let Err(e) = self.sensor.begin(&self.config.sensor) {
            error!("Optical sensor initialization failed: {:?}", e);
            if let Err(e) = self.emitter.emit_text(SENSOR_NOT_FOUND) {
                warn!("Failed to write diagnostic to host: {:?}", e);
            }
            self.state = AcquisitionState::Halted;
            return Err(AcquisitionError::SensorInit);
        }

        info!(
            "Acquisition started: {} slot buffer, GSR on channel {}",
            N, self.config.gsr_channel.0
        );

        if self.config.emit_header {
            if let Err(e) = self.emitter.emit_text(HEADER) {
                warn!("Failed to write header to host: {:?}", e);
            }
        }

        self.state = AcquisitionState::WaitingForSample;
        Ok(())
    }

    /// Perform one state transition and return the new state.
    pub fn step(&mut self) -> AcquisitionState {
        match self.state {
            AcquisitionState::Uninitialized => {
                // Failure is terminal and already reported on the host.
                let _ = self.initialize();
            }
            AcquisitionState::WaitingForSample => {
                match self.poll.wait_for_sample(&mut self.sensor) {
                    PollOutcome::Ready => self.state = AcquisitionState::SampleReady,
                    PollOutcome::GaveUp => {
                        self.stats.stalls += 1;
                        trace!("No optical sample yet ({} stalls)", self.stats.stalls);
                    }
                }
            }
            AcquisitionState::SampleReady => self.acquire(),
            AcquisitionState::Halted => {}
        }
        self.state
    }

    /// Run forever.
    ///
    /// With the default `BusyWait` strategy a sensor that stops producing
    /// data blocks this indefinitely; there is no watchdog or recovery. After
    /// a failed initialization this parks in a spin loop.
    pub fn run(&mut self) -> ! {
        while self.step() != AcquisitionState::Halted {}

        loop {
            core::hint::spin_loop();
        }
    }

    fn acquire(&mut self) {
        // Pop before stamping so a record never carries a timestamp older
        // than the previous one.
        let Some(sample) = self.sensor.pop_sample() else {
            warn!("Optical sensor reported a sample but had none to pop");
            self.state = AcquisitionState::WaitingForSample;
            return;
        };
        let timestamp = self.clock.now();
        let gsr = self.analog.read(self.config.gsr_channel);
        let record = Record::new(timestamp, sample.red, sample.ir, gsr);

        self.buffer.store(&record);
        self.stats.records += 1;
        if self.buffer.cursor() == 0 {
            self.stats.cycles += 1;
            debug!("Sample buffer cycle {} complete", self.stats.cycles);
        }

        if let Err(e) = self.emitter.emit(&record) {
            self.stats.write_failures += 1;
            warn!("Host write failed, record dropped: {:?}", e);
        }

        self.state = AcquisitionState::WaitingForSample;
    }

    pub const fn state(&self) -> AcquisitionState {
        self.state
    }

    pub const fn stats(&self) -> &AcquisitionStats {
        &self.stats
    }

    pub const fn buffer(&self) -> &SampleBuffer<N> {
        &self.buffer
    }

    pub const fn config(&self) -> &AcquisitionConfig {
        &self.config
    }

    pub const fn sensor(&self) -> &S {
        &self.sensor
    }

    pub fn emitter(&self) -> &RecordEmitter<W> {
        &self.emitter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{HostSink, ScriptedAnalog, ScriptedClock, ScriptedSensor};
    use crate::sensors::ChannelId;
    use std::vec::Vec;

    type TestLoop<P, const N: usize> =
        AcquisitionLoop<ScriptedSensor, ScriptedAnalog, ScriptedClock, HostSink, P, N>;

    /// Step until `records` records exist, without polling past them.
    fn drive<P: PollStrategy, const N: usize>(acq: &mut TestLoop<P, N>, records: u64) {
        for _ in 0..100_000 {
            if acq.stats().records == records {
                return;
            }
            acq.step();
        }
        panic!("loop did not produce {records} records");
    }

    fn reference_loop<const N: usize>(config: AcquisitionConfig) -> TestLoop<BusyWait, N> {
        let sensor = ScriptedSensor::new()
            .arrive_at(1, 100, 200)
            .arrive_at(2, 101, 201)
            .arrive_at(3, 102, 202)
            .arrive_at(4, 103, 203);
        AcquisitionLoop::new(
            sensor,
            ScriptedAnalog::new(&[50, 51, 52, 53]),
            ScriptedClock::new(&[0, 0, 1, 1]),
            HostSink::default(),
            config,
        )
    }

    #[test]
    fn test_reference_sequence_output() {
        let mut acq = reference_loop::<100>(AcquisitionConfig::DEFAULT);

        drive(&mut acq, 3);

        assert_eq!(
            acq.emitter().host().text(),
            "0,100,200,50\n0,101,201,51\n1,102,202,52\n"
        );
        assert_eq!(acq.state(), AcquisitionState::WaitingForSample);
        assert_eq!(acq.sensor().polls, 3);
    }

    #[test]
    fn test_fourth_record_overwrites_first_slot() {
        let mut acq = reference_loop::<3>(AcquisitionConfig::DEFAULT);

        drive(&mut acq, 4);

        assert_eq!(acq.buffer().slot(0), Some(Record::new(1, 103, 203, 53)));
        assert_eq!(acq.buffer().slot(2), Some(Record::new(1, 102, 202, 52)));
        assert_eq!(acq.buffer().cursor(), 1);
        assert_eq!(acq.stats().cycles, 1);
        assert_eq!(acq.emitter().host().lines().len(), 4);
    }

    #[test]
    fn test_state_transitions() {
        let mut acq = reference_loop::<100>(AcquisitionConfig::DEFAULT);
        assert_eq!(acq.state(), AcquisitionState::Uninitialized);

        assert_eq!(acq.step(), AcquisitionState::WaitingForSample);
        assert_eq!(acq.step(), AcquisitionState::SampleReady);
        assert_eq!(acq.emitter().emitted(), 0);
        assert_eq!(acq.step(), AcquisitionState::WaitingForSample);
        assert_eq!(acq.emitter().emitted(), 1);
    }

    #[test]
    fn test_init_failure_emits_one_diagnostic_and_halts() {
        let config = AcquisitionConfig {
            emit_header: true,
            ..AcquisitionConfig::DEFAULT
        };
        let mut acq: TestLoop<BusyWait, 100> = AcquisitionLoop::new(
            ScriptedSensor::missing().arrive_at(1, 100, 200),
            ScriptedAnalog::new(&[50]),
            ScriptedClock::new(&[0]),
            HostSink::default(),
            config,
        );

        for _ in 0..1_000 {
            acq.step();
        }

        assert_eq!(acq.state(), AcquisitionState::Halted);
        assert_eq!(acq.emitter().host().lines(), [SENSOR_NOT_FOUND]);
        assert_eq!(acq.emitter().emitted(), 0);
        assert_eq!(acq.stats().records, 0);
        assert_eq!(acq.sensor().begin_calls, 1);
        assert_eq!(acq.sensor().polls, 0);
        assert_eq!(acq.initialize(), Err(AcquisitionError::Halted));
        assert_eq!(acq.emitter().host().lines().len(), 1);
    }

    #[test]
    fn test_explicit_initialize_reports_failure() {
        let mut acq: TestLoop<BusyWait, 100> = AcquisitionLoop::new(
            ScriptedSensor::missing(),
            ScriptedAnalog::new(&[]),
            ScriptedClock::new(&[]),
            HostSink::default(),
            AcquisitionConfig::DEFAULT,
        );

        assert_eq!(acq.initialize(), Err(AcquisitionError::SensorInit));
        assert_eq!(acq.step(), AcquisitionState::Halted);
    }

    #[test]
    fn test_silent_sensor_blocks_without_emitting() {
        let mut acq: TestLoop<SpinLimit, 100> = AcquisitionLoop::with_poll_strategy(
            ScriptedSensor::new(),
            ScriptedAnalog::new(&[50]),
            ScriptedClock::new(&[0]),
            HostSink::default(),
            AcquisitionConfig::DEFAULT,
            SpinLimit::new(1_000),
        );

        for _ in 0..50 {
            acq.step();
        }

        assert_eq!(acq.state(), AcquisitionState::WaitingForSample);
        assert!(acq.emitter().host().bytes.is_empty());
        assert_eq!(acq.stats().records, 0);
        assert_eq!(acq.stats().stalls, 49);
        assert_eq!(acq.sensor().polls, 49_000);
    }

    #[test]
    fn test_late_sample_is_picked_up_after_stalls() {
        let mut acq: TestLoop<SpinLimit, 100> = AcquisitionLoop::with_poll_strategy(
            ScriptedSensor::new().arrive_at(25, 7, 8),
            ScriptedAnalog::new(&[9]),
            ScriptedClock::new(&[4]),
            HostSink::default(),
            AcquisitionConfig::DEFAULT,
            SpinLimit::new(10),
        );

        drive(&mut acq, 1);

        assert_eq!(acq.stats().stalls, 2);
        assert_eq!(acq.emitter().host().text(), "4,7,8,9\n");
    }

    #[test]
    fn test_timestamps_never_decrease() {
        let samples: Vec<(u32, u32)> = (0..500).map(|i| (1000 + i, 2000 + i)).collect();
        let ticks: Vec<u32> = (0..500).map(|i| i / 7).collect();
        let mut acq: TestLoop<BusyWait, 100> = AcquisitionLoop::new(
            ScriptedSensor::streaming(&samples),
            ScriptedAnalog::new(&[300]),
            ScriptedClock::new(&ticks),
            HostSink::default(),
            AcquisitionConfig::DEFAULT,
        );

        drive(&mut acq, 500);

        let stamps: Vec<u32> = acq
            .emitter()
            .host()
            .lines()
            .iter()
            .map(|line| line.split(',').next().unwrap().parse().unwrap())
            .collect();
        assert_eq!(stamps.len(), 500);
        assert!(stamps.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(acq.stats().cycles, 5);
    }

    #[test]
    fn test_header_precedes_records_when_enabled() {
        let config = AcquisitionConfig {
            emit_header: true,
            ..AcquisitionConfig::DEFAULT
        };
        let mut acq = reference_loop::<100>(config);

        drive(&mut acq, 2);

        assert_eq!(
            acq.emitter().host().lines(),
            [HEADER, "0,100,200,50", "0,101,201,51"]
        );
    }

    #[test]
    fn test_sensor_receives_configuration_and_gsr_channel_is_used() {
        let config = AcquisitionConfig {
            gsr_channel: ChannelId(3),
            ..AcquisitionConfig::DEFAULT
        };
        let mut acq = reference_loop::<100>(config);

        drive(&mut acq, 2);

        assert_eq!(acq.config().gsr_channel, ChannelId(3));
        assert_eq!(acq.sensor().configured, Some(acq.config().sensor));
        let analog = &acq.analog;
        assert_eq!(analog.channels, [ChannelId(3), ChannelId(3)]);
    }

    #[test]
    fn test_host_failure_keeps_acquiring() {
        let mut acq = reference_loop::<100>(AcquisitionConfig::DEFAULT);
        acq.emitter.host_mut().fail = true;

        drive(&mut acq, 2);

        assert_eq!(acq.stats().write_failures, 2);
        assert_eq!(acq.buffer().slot(1), Some(Record::new(0, 101, 201, 51)));
        assert_eq!(acq.state(), AcquisitionState::WaitingForSample);
    }

    #[test]
    fn test_empty_pop_returns_to_waiting() {
        let mut acq = reference_loop::<100>(AcquisitionConfig::DEFAULT);
        acq.step();
        acq.state = AcquisitionState::SampleReady;

        assert_eq!(acq.step(), AcquisitionState::WaitingForSample);
        assert_eq!(acq.stats().records, 0);
        assert!(acq.emitter().host().bytes.is_empty());
    }
}
