//! Board wiring and the fixed acquisition configuration
//!
//! ```text
//! MAX30105 breakout:  SDA = GPIO12, SCL = GPIO11, INT = not connected
//! GSR sensor:         SIG = GPIO1 (ADC1 channel 0)
//! Host:               UART0, TX = GPIO43, RX = GPIO44
//! ```

use pulse_core::AcquisitionConfig;

/// I2C bus speed for the optical sensor (fast mode)
pub const I2C_FREQUENCY_KHZ: u32 = 400;

/// Everything is fixed at build time; see `AcquisitionConfig::DEFAULT`.
pub const ACQUISITION: AcquisitionConfig = AcquisitionConfig::DEFAULT;
