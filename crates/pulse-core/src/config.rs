//! Startup configuration for the optical sensor and the acquisition loop
//!
//! Every value here is fixed at process start. The optical options are
//! enums restricted to the settings the MAX3010x family accepts; each one
//! knows the register bits it programs.

use crate::sensors::ChannelId;

/// Number of samples the optical sensor averages into one FIFO entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleAverage {
    One,
    Two,
    Four,
    Eight,
    Sixteen,
    ThirtyTwo,
}

impl SampleAverage {
    /// SMP_AVE field of the FIFO configuration register (bits 7:5)
    pub const fn config_bits(self) -> u8 {
        match self {
            Self::One => 0x00,
            Self::Two => 0x20,
            Self::Four => 0x40,
            Self::Eight => 0x60,
            Self::Sixteen => 0x80,
            Self::ThirtyTwo => 0xA0,
        }
    }

    pub const fn count(self) -> u16 {
        match self {
            Self::One => 1,
            Self::Two => 2,
            Self::Four => 4,
            Self::Eight => 8,
            Self::Sixteen => 16,
            Self::ThirtyTwo => 32,
        }
    }
}

/// Which LEDs are driven, and therefore which channels land in the FIFO
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedMode {
    /// Red only (heart-rate mode); IR is reported as zero
    RedOnly,
    /// Red + IR (SpO2 mode)
    RedIr,
    /// Red + IR + green (multi-LED mode); green is read and discarded
    RedIrGreen,
}

impl LedMode {
    /// MODE field of the mode configuration register
    pub const fn mode_bits(self) -> u8 {
        match self {
            Self::RedOnly => 0x02,
            Self::RedIr => 0x03,
            Self::RedIrGreen => 0x07,
        }
    }

    /// Number of 3-byte channels per FIFO sample
    pub const fn active_leds(self) -> usize {
        match self {
            Self::RedOnly => 1,
            Self::RedIr => 2,
            Self::RedIrGreen => 3,
        }
    }
}

/// Internal sampling rate of the optical front end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleRate {
    Hz50,
    Hz100,
    Hz200,
    Hz400,
    Hz800,
    Hz1000,
    Hz1600,
    Hz3200,
}

impl SampleRate {
    /// SR field of the particle-sensing configuration register (bits 4:2)
    pub const fn config_bits(self) -> u8 {
        match self {
            Self::Hz50 => 0x00,
            Self::Hz100 => 0x04,
            Self::Hz200 => 0x08,
            Self::Hz400 => 0x0C,
            Self::Hz800 => 0x10,
            Self::Hz1000 => 0x14,
            Self::Hz1600 => 0x18,
            Self::Hz3200 => 0x1C,
        }
    }

    pub const fn hz(self) -> u16 {
        match self {
            Self::Hz50 => 50,
            Self::Hz100 => 100,
            Self::Hz200 => 200,
            Self::Hz400 => 400,
            Self::Hz800 => 800,
            Self::Hz1000 => 1000,
            Self::Hz1600 => 1600,
            Self::Hz3200 => 3200,
        }
    }
}

/// LED pulse width; longer pulses give more ADC resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PulseWidth {
    Us69,
    Us118,
    Us215,
    Us411,
}

impl PulseWidth {
    /// LED_PW field of the particle-sensing configuration register (bits 1:0)
    pub const fn config_bits(self) -> u8 {
        match self {
            Self::Us69 => 0x00,
            Self::Us118 => 0x01,
            Self::Us215 => 0x02,
            Self::Us411 => 0x03,
        }
    }
}

/// Full-scale range of the optical ADC, in nA
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdcRange {
    Na2048,
    Na4096,
    Na8192,
    Na16384,
}

impl AdcRange {
    /// ADC_RGE field of the particle-sensing configuration register (bits 6:5)
    pub const fn config_bits(self) -> u8 {
        match self {
            Self::Na2048 => 0x00,
            Self::Na4096 => 0x20,
            Self::Na8192 => 0x40,
            Self::Na16384 => 0x60,
        }
    }
}

/// Parameters handed once to the optical sensor's `begin`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorConfig {
    /// LED drive amplitude: 0 = off, 255 = 50 mA
    pub led_brightness: u8,
    pub sample_average: SampleAverage,
    pub led_mode: LedMode,
    pub sample_rate: SampleRate,
    pub pulse_width: PulseWidth,
    pub adc_range: AdcRange,
}

impl SensorConfig {
    /// Red + IR at 100 Hz with 4x averaging, 411 µs pulses, 4096 nA range
    pub const DEFAULT: Self = Self {
        led_brightness: 60,
        sample_average: SampleAverage::Four,
        led_mode: LedMode::RedIr,
        sample_rate: SampleRate::Hz100,
        pulse_width: PulseWidth::Us411,
        adc_range: AdcRange::Na4096,
    };

    /// Rate at which paired samples appear in the FIFO
    pub const fn effective_rate_hz(&self) -> u16 {
        self.sample_rate.hz() / self.sample_average.count()
    }
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Calendar date/time the clock counts from
///
/// Only a reference point for the emitted timestamps; it is not expected to
/// track real-world time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockOrigin {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl ClockOrigin {
    pub const DEFAULT: Self = Self {
        year: 2023,
        month: 1,
        day: 1,
        hour: 0,
        minute: 0,
        second: 0,
    };

    /// Seconds between 1970-01-01T00:00:00 and this origin
    ///
    /// Dates before 1970 saturate to zero.
    pub const fn epoch_seconds(&self) -> u32 {
        let days = days_from_civil(self.year as i64, self.month as i64, self.day as i64);
        let secs = days * 86_400
            + self.hour as i64 * 3_600
            + self.minute as i64 * 60
            + self.second as i64;

        if secs < 0 {
            0
        } else if secs > u32::MAX as i64 {
            u32::MAX
        } else {
            secs as u32
        }
    }
}

impl Default for ClockOrigin {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Days since 1970-01-01 for a proleptic Gregorian date.
const fn days_from_civil(year: i64, month: i64, day: i64) -> i64 {
    let y = if month <= 2 { year - 1 } else { year };
    let era = (if y >= 0 { y } else { y - 399 }) / 400;
    let yoe = y - era * 400;
    let mp = (month + 9) % 12;
    let doy = (153 * mp + 2) / 5 + day - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

/// Everything the acquisition loop and its bootstrap need
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcquisitionConfig {
    pub sensor: SensorConfig,
    /// Analog channel carrying the GSR signal
    pub gsr_channel: ChannelId,
    /// Host serial line rate, bits per second
    pub baud_rate: u32,
    pub clock_origin: ClockOrigin,
    /// Write a `Timestamp,Red,IR,GSR` line before the first record
    pub emit_header: bool,
}

impl AcquisitionConfig {
    pub const DEFAULT: Self = Self {
        sensor: SensorConfig::DEFAULT,
        gsr_channel: ChannelId(0),
        baud_rate: 115_200,
        clock_origin: ClockOrigin::DEFAULT,
        emit_header: false,
    };
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
