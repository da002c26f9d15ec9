//! MAX30105 optical pulse sensor driver
//!
//! Talks to the MAX30105 (and the register-compatible MAX30102) over
//! blocking I2C. Samples are drained from the chip's 32-entry FIFO into a
//! local queue of the same depth, from which the acquisition loop pops one
//! paired red/IR reading at a time.
//!
//! # Example
//!
//! ```ignore
//! let mut sensor = Max30105::new(i2c, delay);
//! sensor.begin(&SensorConfig::DEFAULT)?;
//!
//! while !sensor.is_available() {}
//! let sample = sensor.pop_sample();
//! ```

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use heapless::Deque;
use log::{debug, info, warn};

use super::{OpticalSensor, PairedSample};
use crate::config::{LedMode, SensorConfig};

/// 7-bit I2C address of the MAX3010x family
pub const MAX30105_ADDRESS: u8 = 0x57;

/// Register addresses
mod reg {
    pub const FIFO_WR_PTR: u8 = 0x04;
    pub const FIFO_OVF_COUNTER: u8 = 0x05;
    pub const FIFO_RD_PTR: u8 = 0x06;
    pub const FIFO_DATA: u8 = 0x07;
    pub const FIFO_CONFIG: u8 = 0x08;
    pub const MODE_CONFIG: u8 = 0x09;
    pub const PARTICLE_CONFIG: u8 = 0x0A;
    pub const LED1_PULSE_AMP: u8 = 0x0C;
    pub const LED2_PULSE_AMP: u8 = 0x0D;
    pub const LED3_PULSE_AMP: u8 = 0x0E;
    pub const LED_PROX_AMP: u8 = 0x10;
    pub const MULTI_LED_CONFIG1: u8 = 0x11;
    pub const MULTI_LED_CONFIG2: u8 = 0x12;
    pub const PART_ID: u8 = 0xFF;
}

/// Register field values
mod bits {
    pub const EXPECTED_PART_ID: u8 = 0x15;
    pub const RESET: u8 = 0x40;
    pub const ROLLOVER_ENABLE: u8 = 0x10;
    pub const SLOT_RED: u8 = 0x01;
    pub const SLOT_IR: u8 = 0x02;
    pub const SLOT_GREEN: u8 = 0x03;
}

const FIFO_DEPTH: usize = 32;
const BYTES_PER_LED: usize = 3;
const MAX_LEDS: usize = 3;
/// FIFO entries are 18-bit, left-padded in 3 bytes
const SAMPLE_MASK: u32 = 0x3_FFFF;
/// FIFO pointers are 5-bit
const POINTER_MASK: u8 = 0x1F;
const RESET_POLL_ATTEMPTS: u8 = 100;
const RESET_POLL_INTERVAL_MS: u32 = 1;

/// MAX30105-specific error type
#[derive(Debug)]
pub enum Max30105Error<E> {
    /// I2C communication error
    Bus(E),
    /// Something answered at the address, but it is not a MAX3010x
    WrongPartId(u8),
    /// The reset bit never self-cleared
    ResetTimeout,
}

/// MAX30105 driver
pub struct Max30105<I, D> {
    i2c: I,
    delay: D,
    address: u8,
    /// Channels per FIFO entry; zero until `begin` succeeds
    active_leds: usize,
    pending: Deque<PairedSample, FIFO_DEPTH>,
}

impl<I, D> Max30105<I, D>
where
    I: I2c,
    D: DelayNs,
{
    /// Create a driver at the default address
    #[must_use]
    pub fn new(i2c: I, delay: D) -> Self {
        Self::with_address(i2c, delay, MAX30105_ADDRESS)
    }

    #[must_use]
    pub fn with_address(i2c: I, delay: D, address: u8) -> Self {
        Self {
            i2c,
            delay,
            address,
            active_leds: 0,
            pending: Deque::new(),
        }
    }

    /// Release the bus and delay
    pub fn release(self) -> (I, D) {
        (self.i2c, self.delay)
    }

    fn read_register(&mut self, register: u8) -> Result<u8, Max30105Error<I::Error>> {
        let mut buf = [0u8; 1];
        self.i2c
            .write_read(self.address, &[register], &mut buf)
            .map_err(Max30105Error::Bus)?;
        Ok(buf[0])
    }

    fn write_register(&mut self, register: u8, value: u8) -> Result<(), Max30105Error<I::Error>> {
        self.i2c
            .write(self.address, &[register, value])
            .map_err(Max30105Error::Bus)
    }

    fn soft_reset(&mut self) -> Result<(), Max30105Error<I::Error>> {
        self.write_register(reg::MODE_CONFIG, bits::RESET)?;

        for _ in 0..RESET_POLL_ATTEMPTS {
            if self.read_register(reg::MODE_CONFIG)? & bits::RESET == 0 {
                return Ok(());
            }
            self.delay.delay_ms(RESET_POLL_INTERVAL_MS);
        }

        Err(Max30105Error::ResetTimeout)
    }

    fn clear_fifo(&mut self) -> Result<(), Max30105Error<I::Error>> {
        self.write_register(reg::FIFO_WR_PTR, 0)?;
        self.write_register(reg::FIFO_OVF_COUNTER, 0)?;
        self.write_register(reg::FIFO_RD_PTR, 0)
    }

    fn configure(&mut self, config: &SensorConfig) -> Result<(), Max30105Error<I::Error>> {
        let part_id = self.read_register(reg::PART_ID)?;
        if part_id != bits::EXPECTED_PART_ID {
            return Err(Max30105Error::WrongPartId(part_id));
        }

        self.soft_reset()?;

        self.write_register(
            reg::FIFO_CONFIG,
            config.sample_average.config_bits() | bits::ROLLOVER_ENABLE,
        )?;
        self.write_register(reg::MODE_CONFIG, config.led_mode.mode_bits())?;
        self.write_register(
            reg::PARTICLE_CONFIG,
            config.adc_range.config_bits()
                | config.sample_rate.config_bits()
                | config.pulse_width.config_bits(),
        )?;

        for register in [
            reg::LED1_PULSE_AMP,
            reg::LED2_PULSE_AMP,
            reg::LED3_PULSE_AMP,
            reg::LED_PROX_AMP,
        ] {
            self.write_register(register, config.led_brightness)?;
        }

        // Slots only matter in multi-LED mode: red, IR, then green.
        if config.led_mode == LedMode::RedIrGreen {
            self.write_register(reg::MULTI_LED_CONFIG1, bits::SLOT_RED | (bits::SLOT_IR << 4))?;
            self.write_register(reg::MULTI_LED_CONFIG2, bits::SLOT_GREEN)?;
        }

        self.clear_fifo()
    }

    /// Drain every unread FIFO entry into the local queue.
    ///
    /// Returns the number of entries read. When the local queue is full the
    /// oldest entry is dropped. Reads nothing before `begin` has succeeded.
    pub fn poll_fifo(&mut self) -> Result<usize, Max30105Error<I::Error>> {
        if self.active_leds == 0 {
            return Ok(0);
        }

        let read_ptr = self.read_register(reg::FIFO_RD_PTR)?;
        let write_ptr = self.read_register(reg::FIFO_WR_PTR)?;
        let entries = if read_ptr == write_ptr {
            // Equal pointers mean empty, or full once samples have been lost.
            let overflow = self.read_register(reg::FIFO_OVF_COUNTER)?;
            if overflow == 0 {
                return Ok(0);
            }
            debug!("MAX30105 FIFO overflowed, {} samples lost", overflow);
            FIFO_DEPTH
        } else {
            (write_ptr.wrapping_sub(read_ptr) & POINTER_MASK) as usize
        };
        let entry_len = self.active_leds * BYTES_PER_LED;
        let mut buf = [0u8; FIFO_DEPTH * MAX_LEDS * BYTES_PER_LED];
        let bytes = &mut buf[..entries * entry_len];

        self.i2c
            .write_read(self.address, &[reg::FIFO_DATA], bytes)
            .map_err(Max30105Error::Bus)?;

        for entry in bytes.chunks_exact(entry_len) {
            let red = decode_channel(&entry[0..BYTES_PER_LED]);
            // Red-only mode has no IR channel; green (if present) is skipped.
            let ir = if self.active_leds >= 2 {
                decode_channel(&entry[BYTES_PER_LED..2 * BYTES_PER_LED])
            } else {
                0
            };

            if self.pending.is_full() {
                self.pending.pop_front();
            }
            let _ = self.pending.push_back(PairedSample::new(red, ir));
        }

        Ok(entries)
    }

    /// Number of samples already drained from the chip and not yet popped
    pub fn queued(&self) -> usize {
        self.pending.len()
    }
}

fn decode_channel(bytes: &[u8]) -> u32 {
    let raw = (u32::from(bytes[0]) << 16) | (u32::from(bytes[1]) << 8) | u32::from(bytes[2]);
    raw & SAMPLE_MASK
}

impl<I, D> OpticalSensor for Max30105<I, D>
where
    I: I2c,
    D: DelayNs,
{
    type Error = Max30105Error<I::Error>;

    fn begin(&mut self, config: &SensorConfig) -> Result<(), Self::Error> {
        self.active_leds = 0;
        self.pending.clear();

        self.configure(config)?;

        self.active_leds = config.led_mode.active_leds();
        info!(
            "MAX30105 ready: {:?}, {} Hz / {} avg",
            config.led_mode,
            config.sample_rate.hz(),
            config.sample_average.count()
        );
        Ok(())
    }

    fn is_available(&mut self) -> bool {
        if !self.pending.is_empty() {
            return true;
        }

        match self.poll_fifo() {
            Ok(_) => !self.pending.is_empty(),
            Err(e) => {
                warn!("MAX30105 FIFO poll failed: {:?}", e);
                false
            }
        }
    }

    fn pop_sample(&mut self) -> Option<PairedSample> {
        self.pending.pop_front()
    }
}
