use super::{SampleWidth, SampleWord};
use crate::record::Record;

/// One ring slot; the optical fields are kept at the configured width.
#[derive(Debug, Clone, Copy, Default)]
struct Slot<W> {
    timestamp: u32,
    red: W,
    ir: W,
    gsr: i32,
}

/// Fixed-capacity ring of the most recent `N` records.
///
/// Allocated once and never resized. There is a single write cursor that
/// advances modulo `N` after every store, so after `k` stores the cursor is
/// `k % N` and the record written by store number `k` (counting from 1)
/// lives in slot `(k - 1) % N`.
///
/// Nothing in the acquisition path reads the buffer back; `slot` exists for
/// inspection and tests.
pub struct SampleBuffer<const N: usize, W: SampleWidth = SampleWord> {
    slots: [Slot<W>; N],
    cursor: usize,
    stored: u64,
}

impl<const N: usize, W: SampleWidth> SampleBuffer<N, W> {
    pub fn new() -> Self {
        const { assert!(N > 0, "sample buffer capacity must be non-zero") };

        Self {
            slots: [Slot::default(); N],
            cursor: 0,
            stored: 0,
        }
    }

    /// Overwrite the slot under the cursor and advance the cursor.
    pub fn store(&mut self, record: &Record) {
        self.slots[self.cursor] = Slot {
            timestamp: record.timestamp,
            red: W::from_raw(record.red),
            ir: W::from_raw(record.ir),
            gsr: record.gsr,
        };
        self.cursor = (self.cursor + 1) % N;
        self.stored += 1;
    }

    /// Index of the next slot to be written, always in `0..N`.
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Total number of stores since allocation
    pub const fn stored(&self) -> u64 {
        self.stored
    }

    /// Number of slots holding a record
    pub fn len(&self) -> usize {
        if self.stored >= N as u64 {
            N
        } else {
            self.stored as usize
        }
    }

    pub fn is_empty(&self) -> bool {
        self.stored == 0
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Record held at `index`, or `None` if the slot was never written.
    pub fn slot(&self, index: usize) -> Option<Record> {
        if index >= self.len() {
            return None;
        }
        let slot = &self.slots[index];
        Some(Record::new(
            slot.timestamp,
            slot.red.to_raw(),
            slot.ir.to_raw(),
            slot.gsr,
        ))
    }
}

impl<const N: usize, W: SampleWidth> Default for SampleBuffer<N, W> {
    fn default() -> Self {
        Self::new()
    }
}
