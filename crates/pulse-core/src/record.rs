//! The unit of output: one timestamp, one paired optical sample, one GSR value.

use core::fmt;

/// A fully assembled acquisition record.
///
/// Records are only ever built from all four values at once, so there is no
/// partially-filled state to store or emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Record {
    /// Seconds since the clock origin
    pub timestamp: u32,
    /// Red LED channel (raw, 18-bit on the MAX3010x)
    pub red: u32,
    /// Infrared LED channel
    pub ir: u32,
    /// Raw skin-conductance ADC reading
    pub gsr: i32,
}

impl Record {
    pub const fn new(timestamp: u32, red: u32, ir: u32, gsr: i32) -> Self {
        Self {
            timestamp,
            red,
            ir,
            gsr,
        }
    }
}

/// Formats as the host line body `timestamp,red,ir,gsr` (no line break).
impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.timestamp, self.red, self.ir, self.gsr)
    }
}
