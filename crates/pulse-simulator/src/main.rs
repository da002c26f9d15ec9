//! Desktop simulator for the pulse acquisition loop.
//!
//! Runs the real `pulse-core` acquisition loop against synthetic
//! collaborators: an optical sensor whose FIFO fills at the configured
//! effective sample rate with a PPG-like waveform, a slowly drifting GSR
//! channel, and a wall clock starting at the configured origin. Records go to
//! stdout in the same `timestamp,red,ir,gsr` format the firmware sends over
//! the serial line; logs go to stderr.
//!
//! # Flags
//!
//! | Flag          | Effect                                           |
//! |---------------|--------------------------------------------------|
//! | `--header`    | Write the `Timestamp,Red,IR,GSR` line first      |
//! | `--no-sensor` | Simulate a missing optical sensor (init failure) |

use std::collections::VecDeque;
use std::f64::consts::TAU;
use std::io::{Stdout, Write as _};
use std::time::Instant;

use embedded_io::{ErrorKind, ErrorType, Write};
use log::info;

use pulse_core::{
    AcquisitionConfig, AcquisitionLoop, AnalogChannel, ChannelId, Clock, OpticalSensor,
    PairedSample, SensorConfig,
};

// ---------------------------------------------------------------------------
// Waveform constants
// ---------------------------------------------------------------------------

/// Simulated heart rate in beats per second (72 bpm).
const HEART_RATE_HZ: f64 = 1.2;

/// DC level and pulsatile amplitude of each optical channel (18-bit counts).
const RED_DC: f64 = 95_000.0;
const RED_AC: f64 = 1_200.0;
const IR_DC: f64 = 110_000.0;
const IR_AC: f64 = 1_800.0;

/// GSR baseline and slow drift (raw 10-bit ADC counts).
const GSR_BASELINE: f64 = 420.0;
const GSR_DRIFT: f64 = 35.0;
const GSR_DRIFT_PERIOD_SECS: f64 = 45.0;

/// Mirror of the chip FIFO depth; older samples are dropped beyond this.
const FIFO_DEPTH: usize = 32;

// ---------------------------------------------------------------------------
// Synthetic collaborators
// ---------------------------------------------------------------------------

/// Optical sensor producing a PPG-like waveform in real time.
struct SimulatedPpg {
    present: bool,
    started: Option<Instant>,
    rate_hz: f64,
    produced: u64,
    fifo: VecDeque<PairedSample>,
}

impl SimulatedPpg {
    fn new(present: bool) -> Self {
        Self {
            present,
            started: None,
            rate_hz: 0.0,
            produced: 0,
            fifo: VecDeque::with_capacity(FIFO_DEPTH),
        }
    }

    /// Sample number `n` of the waveform at the configured rate.
    fn waveform(&self, n: u64) -> PairedSample {
        let t = n as f64 / self.rate_hz;
        let phase = TAU * HEART_RATE_HZ * t;
        // Fundamental plus a dicrotic-notch harmonic; absorption dips the signal.
        let pulse = phase.sin() + 0.35 * (2.0 * phase).sin();

        PairedSample::new(
            (RED_DC - RED_AC * pulse) as u32,
            (IR_DC - IR_AC * pulse) as u32,
        )
    }

    /// Fill the FIFO with every sample due after `elapsed_secs`.
    fn catch_up(&mut self, elapsed_secs: f64) {
        let due = (elapsed_secs * self.rate_hz) as u64;
        while self.produced < due {
            if self.fifo.len() == FIFO_DEPTH {
                self.fifo.pop_front();
            }
            let sample = self.waveform(self.produced);
            self.fifo.push_back(sample);
            self.produced += 1;
        }
    }
}

impl OpticalSensor for SimulatedPpg {
    type Error = &'static str;

    fn begin(&mut self, config: &SensorConfig) -> Result<(), Self::Error> {
        if !self.present {
            return Err("no optical sensor attached");
        }
        self.rate_hz = f64::from(config.effective_rate_hz().max(1));
        self.started = Some(Instant::now());
        info!("Simulated PPG running at {} samples/s", self.rate_hz);
        Ok(())
    }

    fn is_available(&mut self) -> bool {
        if let Some(started) = self.started {
            self.catch_up(started.elapsed().as_secs_f64());
        }
        !self.fifo.is_empty()
    }

    fn pop_sample(&mut self) -> Option<PairedSample> {
        self.fifo.pop_front()
    }
}

/// GSR channel drifting around a baseline.
struct SimulatedGsr {
    started: Instant,
}

impl AnalogChannel for SimulatedGsr {
    fn read(&mut self, _channel: ChannelId) -> i32 {
        let t = self.started.elapsed().as_secs_f64();
        (GSR_BASELINE + GSR_DRIFT * (TAU * t / GSR_DRIFT_PERIOD_SECS).sin()) as i32
    }
}

/// Seconds since the configured origin, advanced by wall time.
struct WallClock {
    origin: u32,
    started: Instant,
}

impl Clock for WallClock {
    fn now(&mut self) -> u32 {
        self.origin
            .saturating_add(self.started.elapsed().as_secs() as u32)
    }
}

/// Stdout as the host channel.
struct StdoutHost(Stdout);

impl ErrorType for StdoutHost {
    type Error = ErrorKind;
}

impl Write for StdoutHost {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.0.write(buf).map_err(|_| ErrorKind::Other)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.0.flush().map_err(|_| ErrorKind::Other)
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut emit_header = false;
    let mut sensor_present = true;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--header" => emit_header = true,
            "--no-sensor" => sensor_present = false,
            other => log::warn!("Ignoring unknown argument {other}"),
        }
    }

    let config = AcquisitionConfig {
        emit_header,
        ..AcquisitionConfig::DEFAULT
    };
    info!("Starting pulse simulator");
    info!(
        "Clock origin {:?} ({} s since epoch)",
        config.clock_origin,
        config.clock_origin.epoch_seconds()
    );

    let started = Instant::now();
    let mut acquisition: AcquisitionLoop<_, _, _, _> = AcquisitionLoop::new(
        SimulatedPpg::new(sensor_present),
        SimulatedGsr { started },
        WallClock {
            origin: config.clock_origin.epoch_seconds(),
            started,
        },
        StdoutHost(std::io::stdout()),
        config,
    );

    acquisition.run()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running(rate_hz: f64) -> SimulatedPpg {
        let mut sensor = SimulatedPpg::new(true);
        sensor.rate_hz = rate_hz;
        sensor
    }

    #[test]
    fn test_fifo_fills_at_configured_rate() {
        let mut sensor = running(25.0);

        sensor.catch_up(0.5);
        assert_eq!(sensor.fifo.len(), 12);

        sensor.catch_up(1.0);
        assert_eq!(sensor.fifo.len(), 25);
    }

    #[test]
    fn test_fifo_drops_oldest_beyond_depth() {
        let mut sensor = running(100.0);

        sensor.catch_up(1.0);

        assert_eq!(sensor.fifo.len(), FIFO_DEPTH);
        assert_eq!(sensor.pop_sample(), Some(sensor.waveform(100 - FIFO_DEPTH as u64)));
    }

    #[test]
    fn test_missing_sensor_fails_begin() {
        let mut sensor = SimulatedPpg::new(false);
        assert!(sensor.begin(&SensorConfig::DEFAULT).is_err());
        assert!(!sensor.is_available());
    }

    #[test]
    fn test_waveform_stays_in_18_bit_range() {
        let sensor = running(25.0);
        for n in 0..250 {
            let sample = sensor.waveform(n);
            assert!(sample.red < 1 << 18);
            assert!(sample.ir < 1 << 18);
        }
    }
}
