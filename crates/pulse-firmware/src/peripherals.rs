//! Adapters from ESP32-S3 peripherals to the `pulse-core` traits

use embedded_io::{ErrorKind, ErrorType, Write};
use esp_hal::Blocking;
use esp_hal::time::Instant;
use esp_hal::uart::Uart;
use pulse_core::{AnalogChannel, ChannelId, Clock};

/// UART used as the host channel
pub struct UartHost<'d> {
    uart: Uart<'d, Blocking>,
}

impl<'d> UartHost<'d> {
    pub fn new(uart: Uart<'d, Blocking>) -> Self {
        Self { uart }
    }
}

impl ErrorType for UartHost<'_> {
    type Error = ErrorKind;
}

impl Write for UartHost<'_> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.uart.write(buf).map_err(|e| {
            log::error!("UART write failed: {:?}", e);
            ErrorKind::Other
        })
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.uart.flush().map_err(|_| ErrorKind::Other)
    }
}

/// Seconds since boot, offset by the configured origin
pub struct UptimeClock {
    origin: u32,
}

impl UptimeClock {
    pub const fn new(origin: u32) -> Self {
        Self { origin }
    }
}

impl Clock for UptimeClock {
    fn now(&mut self) -> u32 {
        let uptime = Instant::now().duration_since_epoch().as_secs();
        self.origin.saturating_add(uptime as u32)
    }
}

/// Analog channel backed by a oneshot read closure
///
/// The ADC driver types carry the pin in their signature, so the bin wires
/// the concrete read in as a closure.
pub struct OneshotAnalog<F> {
    read: F,
}

impl<F> OneshotAnalog<F>
where
    F: FnMut(ChannelId) -> u16,
{
    pub const fn new(read: F) -> Self {
        Self { read }
    }
}

impl<F> AnalogChannel for OneshotAnalog<F>
where
    F: FnMut(ChannelId) -> u16,
{
    fn read(&mut self, channel: ChannelId) -> i32 {
        i32::from((self.read)(channel))
    }
}
