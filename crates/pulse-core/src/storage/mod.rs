mod sample_buffer;

pub use sample_buffer::*;

/// Default number of records held by the sample ring buffer
///
/// 100 slots is four seconds of data at the sensor's effective 25 sps
/// (100 Hz sampling with 4x averaging).
pub const DEFAULT_BUFFER_CAPACITY: usize = 100;

/// Word used for the red/IR fields of buffer slots
///
/// Selected once at build time: 16-bit with the `narrow-storage` feature for
/// small-RAM targets, 32-bit otherwise.
#[cfg(feature = "narrow-storage")]
pub type SampleWord = u16;

/// Word used for the red/IR fields of buffer slots
///
/// Selected once at build time: 16-bit with the `narrow-storage` feature for
/// small-RAM targets, 32-bit otherwise.
#[cfg(not(feature = "narrow-storage"))]
pub type SampleWord = u32;

/// Storage width for the optical fields of a buffer slot.
pub trait SampleWidth: Copy + Default {
    /// Narrow a raw optical reading into this width (truncating).
    fn from_raw(raw: u32) -> Self;

    /// Widen back to the record's field type.
    fn to_raw(self) -> u32;
}

impl SampleWidth for u16 {
    fn from_raw(raw: u32) -> Self {
        raw as u16
    }

    fn to_raw(self) -> u32 {
        self.into()
    }
}

impl SampleWidth for u32 {
    fn from_raw(raw: u32) -> Self {
        raw
    }

    fn to_raw(self) -> u32 {
        self
    }
}
