//! # Steganographic Bit-Stream Reader
//!
//! A stateful cursor that reads individual bits out of pixel samples in a
//! fixed traversal order and assembles them into bytes and a length-prefixed
//! payload.
//!
//! ## Wire format
//!
//! A payload is framed as a 64-bit unsigned big-endian length `L` followed by
//! `L` bytes, each byte assembled MSB-first from 8 consecutive bit reads.
//! There is no checksum and no magic marker, so the capacity check in
//! [`StegoBitstreamReader::decode_payload`] is the only safety net against a
//! hostile length field.
//!
//! ## Traversal order
//!
//! Channel-fastest, column-next, row-last. A progressive schedule restarts at
//! `(0, 0, 0)` with the next significance mask once a full pass completes.
//! This order must be reproduced bit-for-bit to interoperate with payloads
//! produced by [`crate::stego::writer::StegoBitstreamWriter`] or any matching
//! encoder.

use serde::{Deserialize, Serialize};

use crate::stego::error::StegoError;
use crate::stego::grid::PixelGrid;

/// Which significance masks a decode pass sweeps through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MaskSchedule {
    /// A single pass over the least significant bit (mask 1).
    Fixed,
    /// All eight single-bit masks in strictly increasing order
    /// (1, 2, 4, ..., 128), escalating only after a full image pass.
    Progressive,
}

/// Cursor position plus the active one-bit significance mask.
///
/// Advances channel-fastest, then column, then row; wraps back to `(0, 0, 0)`
/// only once every slot under the current mask has been visited. Monotonic:
/// each slot is visited at most once per pass.
#[derive(Debug, Clone)]
pub(crate) struct BitCursor {
    height: u32,
    width: u32,
    channels: u32,
    row: u32,
    col: u32,
    channel: u32,
    mask: u8,
    schedule: MaskSchedule,
    done: bool,
}

impl BitCursor {
    pub(crate) fn new(image: &PixelGrid, schedule: MaskSchedule) -> Self {
        Self {
            height: image.height(),
            width: image.width(),
            channels: image.channels(),
            row: 0,
            col: 0,
            channel: 0,
            mask: 1,
            schedule,
            done: image.bit_capacity() == 0,
        }
    }

    pub(crate) fn done(&self) -> bool {
        self.done
    }

    pub(crate) fn mask(&self) -> u8 {
        self.mask
    }

    /// Plane index of the active mask (0 for mask 1, 7 for mask 128).
    pub(crate) fn plane(&self) -> u8 {
        self.mask.trailing_zeros() as u8
    }

    pub(crate) fn position(&self) -> (u32, u32, u32) {
        (self.row, self.col, self.channel)
    }

    /// Move to the next slot, escalating the mask at the end of a pass when
    /// the schedule is progressive and marking the cursor exhausted otherwise.
    pub(crate) fn advance(&mut self) {
        self.channel += 1;
        if self.channel < self.channels {
            return;
        }
        self.channel = 0;
        self.col += 1;
        if self.col < self.width {
            return;
        }
        self.col = 0;
        self.row += 1;
        if self.row < self.height {
            return;
        }
        self.row = 0;
        match self.schedule {
            MaskSchedule::Fixed => self.done = true,
            MaskSchedule::Progressive => {
                if self.mask == 0x80 {
                    self.done = true;
                } else {
                    self.mask <<= 1;
                }
            }
        }
    }

    /// Bits still readable before the schedule is exhausted.
    pub(crate) fn remaining_bits(&self) -> u64 {
        if self.done {
            return 0;
        }
        let per_pass = self.height as u64 * self.width as u64 * self.channels as u64;
        let consumed = (self.row as u64 * self.width as u64 + self.col as u64)
            * self.channels as u64
            + self.channel as u64;
        let passes_left = match self.schedule {
            MaskSchedule::Fixed => 0,
            MaskSchedule::Progressive => 7 - self.mask.trailing_zeros() as u64,
        };
        (per_pass - consumed) + passes_left * per_pass
    }
}

/// Reads a hidden bit stream out of an immutable image.
pub struct StegoBitstreamReader<'a> {
    image: &'a PixelGrid,
    cursor: BitCursor,
    bits_read: u64,
}

impl<'a> StegoBitstreamReader<'a> {
    pub fn new(image: &'a PixelGrid, schedule: MaskSchedule) -> Self {
        Self {
            image,
            cursor: BitCursor::new(image, schedule),
            bits_read: 0,
        }
    }

    /// Bits still readable under the active schedule.
    pub fn remaining_bits(&self) -> u64 {
        self.cursor.remaining_bits()
    }

    /// Read the bit under the cursor's mask and advance.
    pub fn read_bit(&mut self) -> Result<bool, StegoError> {
        if self.cursor.done() {
            return Err(StegoError::ReaderExhausted {
                plane: self.cursor.plane(),
                bits_read: self.bits_read,
            });
        }
        let (row, col, channel) = self.cursor.position();
        let bit = self.image.sample(row, col, channel) & self.cursor.mask() != 0;
        self.cursor.advance();
        self.bits_read += 1;
        Ok(bit)
    }

    /// Read `count` bits (at most 64) into the low end of a `u64`, MSB first.
    pub fn read_bits(&mut self, count: u32) -> Result<u64, StegoError> {
        assert!(count <= 64, "at most 64 bits per read");
        let mut value = 0u64;
        for _ in 0..count {
            value = (value << 1) | self.read_bit()? as u64;
        }
        Ok(value)
    }

    /// Read eight bits as one byte, MSB first.
    pub fn read_byte(&mut self) -> Result<u8, StegoError> {
        Ok(self.read_bits(8)? as u8)
    }

    /// Decode a full length-prefixed payload.
    ///
    /// Reads the 64-bit big-endian length and validates it against the
    /// remaining cursor capacity *before* consuming any payload bit; a length
    /// that cannot fit fails with [`StegoError::MalformedLength`] without a
    /// single out-of-bounds read.
    pub fn decode_payload(&mut self) -> Result<Vec<u8>, StegoError> {
        let declared = self.read_bits(64)?;
        let capacity_bits = self.cursor.remaining_bits();
        let needed = declared
            .checked_mul(8)
            .ok_or(StegoError::MalformedLength {
                declared,
                capacity_bits,
            })?;
        if needed > capacity_bits {
            return Err(StegoError::MalformedLength {
                declared,
                capacity_bits,
            });
        }
        let mut payload = Vec::with_capacity(declared as usize);
        for _ in 0..declared {
            payload.push(self.read_byte()?);
        }
        Ok(payload)
    }
}
