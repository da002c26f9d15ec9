//! Serializes records to the host channel as `timestamp,red,ir,gsr` lines

use core::fmt::Write as _;

use embedded_io::Write;
use heapless::String;

use crate::record::Record;

/// Column header, written once when enabled
pub const HEADER: &str = "Timestamp,Red,IR,GSR";

/// Longest possible line: three u32 fields, one i32 field, separators, newline
const LINE_CAPACITY: usize = 48;

/// Writes records to any `embedded_io::Write` sink.
///
/// Lines go out synchronously in call order. There is no retry; a failed
/// write is returned to the caller and the line is lost.
pub struct RecordEmitter<W> {
    host: W,
    emitted: u64,
}

impl<W: Write> RecordEmitter<W> {
    pub fn new(host: W) -> Self {
        Self { host, emitted: 0 }
    }

    /// Write one record line.
    pub fn emit(&mut self, record: &Record) -> Result<(), W::Error> {
        let mut line: String<LINE_CAPACITY> = String::new();
        // Four decimal integers always fit in the line buffer.
        let _ = writeln!(line, "{record}");

        self.host.write_all(line.as_bytes())?;
        self.emitted += 1;
        Ok(())
    }

    /// Write a free-form text line (header, diagnostics).
    pub fn emit_text(&mut self, text: &str) -> Result<(), W::Error> {
        self.host.write_all(text.as_bytes())?;
        self.host.write_all(b"\n")
    }

    /// Number of record lines written successfully
    pub const fn emitted(&self) -> u64 {
        self.emitted
    }

    pub fn host(&self) -> &W {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut W {
        &mut self.host
    }

    pub fn into_inner(self) -> W {
        self.host
    }
}
