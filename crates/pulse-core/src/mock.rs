//! Scripted collaborators shared by the unit tests

use std::collections::VecDeque;
use std::string::String;
use std::vec::Vec;

use embedded_io::{ErrorKind, ErrorType, Write};

use crate::config::SensorConfig;
use crate::sensors::{AnalogChannel, ChannelId, Clock, OpticalSensor, PairedSample};

/// Optical sensor whose samples arrive at fixed poll numbers
pub struct ScriptedSensor {
    begin_ok: bool,
    arrivals: VecDeque<(u64, PairedSample)>,
    ready: VecDeque<PairedSample>,
    pub polls: u64,
    pub begin_calls: u32,
    pub configured: Option<SensorConfig>,
}

impl ScriptedSensor {
    pub fn new() -> Self {
        Self {
            begin_ok: true,
            arrivals: VecDeque::new(),
            ready: VecDeque::new(),
            polls: 0,
            begin_calls: 0,
            configured: None,
        }
    }

    /// A sensor that is never found on the bus
    pub fn missing() -> Self {
        Self {
            begin_ok: false,
            ..Self::new()
        }
    }

    /// `sample` becomes available on the `poll`-th availability check.
    pub fn arrive_at(mut self, poll: u64, red: u32, ir: u32) -> Self {
        self.arrivals.push_back((poll, PairedSample::new(red, ir)));
        self
    }

    /// One sample per poll, in order.
    pub fn streaming(samples: &[(u32, u32)]) -> Self {
        samples
            .iter()
            .enumerate()
            .fold(Self::new(), |sensor, (i, &(red, ir))| {
                sensor.arrive_at(i as u64 + 1, red, ir)
            })
    }
}

impl OpticalSensor for ScriptedSensor {
    type Error = &'static str;

    fn begin(&mut self, config: &SensorConfig) -> Result<(), Self::Error> {
        self.begin_calls += 1;
        if !self.begin_ok {
            return Err("not found");
        }
        self.configured = Some(*config);
        Ok(())
    }

    fn is_available(&mut self) -> bool {
        self.polls += 1;
        while let Some(&(poll, sample)) = self.arrivals.front() {
            if poll > self.polls {
                break;
            }
            self.ready.push_back(sample);
            self.arrivals.pop_front();
        }
        !self.ready.is_empty()
    }

    fn pop_sample(&mut self) -> Option<PairedSample> {
        self.ready.pop_front()
    }
}

/// Analog channel returning scripted values, repeating the last one
pub struct ScriptedAnalog {
    values: VecDeque<i32>,
    last: i32,
    pub channels: Vec<ChannelId>,
}

impl ScriptedAnalog {
    pub fn new(values: &[i32]) -> Self {
        Self {
            values: values.iter().copied().collect(),
            last: 0,
            channels: Vec::new(),
        }
    }
}

impl AnalogChannel for ScriptedAnalog {
    fn read(&mut self, channel: ChannelId) -> i32 {
        self.channels.push(channel);
        if let Some(value) = self.values.pop_front() {
            self.last = value;
        }
        self.last
    }
}

/// Clock returning scripted values, repeating the last one
pub struct ScriptedClock {
    values: VecDeque<u32>,
    last: u32,
}

impl ScriptedClock {
    pub fn new(values: &[u32]) -> Self {
        Self {
            values: values.iter().copied().collect(),
            last: 0,
        }
    }
}

impl Clock for ScriptedClock {
    fn now(&mut self) -> u32 {
        if let Some(value) = self.values.pop_front() {
            self.last = value;
        }
        self.last
    }
}

/// In-memory host channel
#[derive(Default)]
pub struct HostSink {
    pub bytes: Vec<u8>,
    pub fail: bool,
}

impl HostSink {
    pub fn text(&self) -> String {
        String::from_utf8(self.bytes.clone()).unwrap()
    }

    pub fn lines(&self) -> Vec<String> {
        self.text().lines().map(String::from).collect()
    }
}

impl ErrorType for HostSink {
    type Error = ErrorKind;
}

impl Write for HostSink {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        if self.fail {
            return Err(ErrorKind::Other);
        }
        self.bytes.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}
