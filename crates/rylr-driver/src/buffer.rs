//! Fixed-capacity receive buffer.
//!
//! Frames are stored back to back, each terminated by a NUL byte written in
//! place of its line terminator:
//!
//! ```text
//!  0                read_cursor                write_cursor      capacity
//!  |  consumed ...   | frame\0 | frame\0 | ...  |   free space     |
//! ```
//!
//! Invariant: `read_cursor <= write_cursor <= capacity`, and when the two
//! cursors meet both are reset to zero.

use std::ops::Range;

/// Byte arena holding NUL-separated frames.
#[derive(Debug, Clone)]
pub struct ReceiveBuffer {
    data: Box<[u8]>,
    write_cursor: usize,
    read_cursor: usize,
}

impl ReceiveBuffer {
    /// Create an empty buffer of `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        ReceiveBuffer {
            data: vec![0; capacity].into_boxed_slice(),
            write_cursor: 0,
            read_cursor: 0,
        }
    }

    /// Total capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Offset one past the last committed frame.
    pub fn write_cursor(&self) -> usize {
        self.write_cursor
    }

    /// Offset of the next unconsumed frame.
    pub fn read_cursor(&self) -> usize {
        self.read_cursor
    }

    /// Bytes available for new frames.
    pub fn free(&self) -> usize {
        self.capacity() - self.write_cursor
    }

    /// True when no committed frame is waiting to be consumed.
    pub fn is_empty(&self) -> bool {
        self.read_cursor == self.write_cursor
    }

    /// Discard everything.
    pub fn reset(&mut self) {
        self.write_cursor = 0;
        self.read_cursor = 0;
    }

    /// Write `byte` at `offset` past the write cursor without committing it.
    ///
    /// Returns false if the position lies outside the buffer.
    pub fn stage(&mut self, offset: usize, byte: u8) -> bool {
        match self.data.get_mut(self.write_cursor + offset) {
            Some(slot) => {
                *slot = byte;
                true
            }
            None => false,
        }
    }

    /// Commit the first `len` staged bytes as a frame.
    ///
    /// Writes the NUL separator after them and returns the frame's start
    /// offset, or `None` if the frame and its separator do not fit.
    pub fn commit(&mut self, len: usize) -> Option<usize> {
        let start = self.write_cursor;
        let separator = self.data.get_mut(start + len)?;
        *separator = 0;
        self.write_cursor = start + len + 1;
        Some(start)
    }

    /// Move the write cursor back to `offset`, dropping frames at and after it.
    ///
    /// The dropped bytes stay readable through [`slice`](Self::slice) until
    /// they are overwritten.
    pub fn truncate(&mut self, offset: usize) {
        self.write_cursor = offset.clamp(self.read_cursor, self.write_cursor);
        self.normalize();
    }

    /// Mark `len` bytes at the read cursor as consumed.
    pub fn consume(&mut self, len: usize) {
        self.read_cursor = (self.read_cursor + len).min(self.write_cursor);
        self.normalize();
    }

    /// Committed, unconsumed bytes.
    pub fn pending(&self) -> &[u8] {
        &self.data[self.read_cursor..self.write_cursor]
    }

    /// Raw storage in `range`, regardless of the cursors.
    pub fn slice(&self, range: Range<usize>) -> &[u8] {
        let end = range.end.min(self.data.len());
        &self.data[range.start.min(end)..end]
    }

    /// Raw storage from `start` to the end of the buffer.
    pub fn slice_from(&self, start: usize) -> &[u8] {
        self.slice(start..self.data.len())
    }

    fn normalize(&mut self) {
        if self.read_cursor == self.write_cursor {
            self.reset();
        }
    }
}
