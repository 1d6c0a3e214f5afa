//! Core layout types
//!
//! A [`BitRange`] names a run of bits inside a PDU buffer. Bit positions use
//! the usual CAN numbering: bit `n` is bit `n % 8` (0 = LSB) of byte `n / 8`.

use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Byte order of a multi-byte signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ByteOrder {
    /// Big-endian ("Motorola"): `start_bit` is the MSB, the range grows
    /// towards higher byte indices
    #[serde(alias = "motorola")]
    Big,
    /// Little-endian ("Intel"): `start_bit` is the LSB, bits ascend
    #[default]
    #[serde(alias = "intel")]
    Little,
}

/// A run of bits inside a PDU buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitRange {
    /// Position of the LSB (little-endian) or MSB (big-endian)
    pub start_bit: u16,
    /// Number of bits
    pub length: u16,
    #[serde(default)]
    pub byte_order: ByteOrder,
}

impl BitRange {
    pub fn new(start_bit: u16, length: u16, byte_order: ByteOrder) -> Self {
        Self {
            start_bit,
            length,
            byte_order,
        }
    }

    /// Little-endian range starting at `start_bit`
    pub fn little(start_bit: u16, length: u16) -> Self {
        Self::new(start_bit, length, ByteOrder::Little)
    }

    /// Big-endian range whose MSB sits at `start_bit`
    pub fn big(start_bit: u16, length: u16) -> Self {
        Self::new(start_bit, length, ByteOrder::Big)
    }

    /// Same width and byte order, moved to another start bit
    pub fn with_start(self, start_bit: u16) -> Self {
        Self { start_bit, ..self }
    }

    /// First and last byte index touched by this range (inclusive).
    ///
    /// Returns `None` for an empty range.
    pub fn byte_span(&self) -> Option<(usize, usize)> {
        if self.length == 0 {
            return None;
        }
        let start = usize::from(self.start_bit);
        let length = usize::from(self.length);
        let first = start / 8;
        let last = match self.byte_order {
            ByteOrder::Little => (start + length - 1) / 8,
            ByteOrder::Big => {
                let in_first = start % 8 + 1;
                if length <= in_first {
                    first
                } else {
                    first + (length - in_first).div_ceil(8)
                }
            }
        };
        Some((first, last))
    }

    /// Minimum buffer length that holds the whole range
    pub fn bytes_required(&self) -> usize {
        self.byte_span().map_or(0, |(_, last)| last + 1)
    }

    /// True if every bit of the range lies within a buffer of `len` bytes
    pub fn is_contained_in(&self, len: usize) -> bool {
        self.byte_span().is_some_and(|(_, last)| last < len)
    }

    /// Ranges wider than a `u64` are copied as raw bytes
    pub fn is_opaque(&self) -> bool {
        self.length > 64
    }

    /// Byte range covered when the range consists of whole bytes
    pub fn aligned_bytes(&self) -> Option<Range<usize>> {
        let aligned_start = match self.byte_order {
            ByteOrder::Little => self.start_bit % 8 == 0,
            ByteOrder::Big => self.start_bit % 8 == 7,
        };
        if !aligned_start || self.length % 8 != 0 {
            return None;
        }
        let (first, last) = self.byte_span()?;
        Some(first..last + 1)
    }

    /// Bit positions from MSB to LSB
    pub(crate) fn positions(&self) -> BitCursor {
        let start = usize::from(self.start_bit);
        let length = usize::from(self.length);
        let next = match self.byte_order {
            ByteOrder::Little => start + length.saturating_sub(1),
            ByteOrder::Big => start,
        };
        BitCursor {
            next,
            remaining: length,
            byte_order: self.byte_order,
        }
    }
}

/// Walks the bit positions of a range, most significant bit first
pub(crate) struct BitCursor {
    next: usize,
    remaining: usize,
    byte_order: ByteOrder,
}

impl Iterator for BitCursor {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        let current = self.next;
        self.remaining -= 1;
        if self.remaining > 0 {
            self.next = match self.byte_order {
                ByteOrder::Little => current - 1,
                // Sawtooth: bit 0 of a byte continues at bit 7 of the next one
                ByteOrder::Big if current % 8 == 0 => current + 15,
                ByteOrder::Big => current - 1,
            };
        }
        Some(current)
    }
}

/// Update bit that flags whether a signal in a PDU carries a fresh value
///
/// Configured as a bit position; stored as byte index plus mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u16", into = "u16")]
pub struct UpdateBit {
    byte_index: usize,
    mask: u8,
}

impl UpdateBit {
    /// Update bit at absolute bit position `bit`
    pub fn at_bit(bit: u16) -> Self {
        Self {
            byte_index: usize::from(bit / 8),
            mask: 1 << (bit % 8),
        }
    }

    pub fn byte_index(&self) -> usize {
        self.byte_index
    }

    pub fn mask(&self) -> u8 {
        self.mask
    }

    /// Update-bit rule.
    ///
    /// A PDU too short to carry the update bit counts as updated; otherwise
    /// the item is updated iff the bit is set.
    pub fn is_updated(&self, payload: &[u8]) -> bool {
        match payload.get(self.byte_index) {
            None => true,
            Some(byte) => byte & self.mask != 0,
        }
    }

    /// Set the bit in `buffer`. Returns false if the buffer is too short.
    pub fn set(&self, buffer: &mut [u8]) -> bool {
        match buffer.get_mut(self.byte_index) {
            Some(byte) => {
                *byte |= self.mask;
                true
            }
            None => false,
        }
    }
}

impl From<u16> for UpdateBit {
    fn from(bit: u16) -> Self {
        Self::at_bit(bit)
    }
}

impl From<UpdateBit> for u16 {
    fn from(update_bit: UpdateBit) -> Self {
        // Config positions fit in u16, so the byte index does too
        (update_bit.byte_index as u16) * 8 + update_bit.mask.trailing_zeros() as u16
    }
}
