//! Framed byte ring between execution partitions
//!
//! Same wrap-around discipline as [`BoundedRingQueue`](crate::BoundedRingQueue)
//! but byte granular. Each entry is a self-describing frame:
//!
//! ```text
//! +--------+-------------+-------------+------------------+
//! | header | group (LE)  | length (LE) | payload          |
//! | 0xC5   | u16         | u16         | `length` bytes   |
//! +--------+-------------+-------------+------------------+
//! ```
//!
//! Frames may wrap across the end of the buffer.

use crate::error::PartitionQueueError;

/// Discriminator byte that starts every frame
pub const FRAME_HEADER: u8 = 0xC5;

/// Header, group index and length field
pub const FRAME_OVERHEAD: usize = 5;

/// Decoded frame metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameInfo {
    /// Destination description-group index
    pub group: u16,
    pub payload_len: usize,
}

impl FrameInfo {
    /// Bytes the frame occupied in the ring
    pub fn encoded_len(&self) -> usize {
        FRAME_OVERHEAD + self.payload_len
    }
}

/// Byte ring carrying gateway frames into one partition
#[derive(Debug, Clone)]
pub struct CrossPartitionQueue {
    buf: Box<[u8]>,
    read: usize,
    write: usize,
}

impl CrossPartitionQueue {
    /// Queue holding up to `capacity` bytes of frames
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: vec![0; capacity + 1].into_boxed_slice(),
            read: 0,
            write: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buf.len() - 1
    }

    /// Bytes currently queued
    pub fn used(&self) -> usize {
        (self.write + self.buf.len() - self.read) % self.buf.len()
    }

    pub fn free(&self) -> usize {
        self.capacity() - self.used()
    }

    pub fn is_empty(&self) -> bool {
        self.read == self.write
    }

    /// Append one frame. Nothing is written if it does not fit.
    pub fn write_frame(&mut self, group: u16, payload: &[u8]) -> Result<(), PartitionQueueError> {
        let len = u16::try_from(payload.len())
            .map_err(|_| PartitionQueueError::PayloadTooLarge(payload.len()))?;
        let needed = FRAME_OVERHEAD + payload.len();
        let free = self.free();
        if needed > free {
            return Err(PartitionQueueError::Full { needed, free });
        }

        let group = group.to_le_bytes();
        let len = len.to_le_bytes();
        self.put(&[FRAME_HEADER, group[0], group[1], len[0], len[1]]);
        self.put(payload);
        Ok(())
    }

    /// Remove the oldest frame, copying its payload into `out`.
    ///
    /// Returns `Ok(None)` when empty. On error the read cursor is left in
    /// place; callers resynchronise with [`flush`](Self::flush).
    pub fn read_frame(&mut self, out: &mut Vec<u8>) -> Result<Option<FrameInfo>, PartitionQueueError> {
        if self.is_empty() {
            return Ok(None);
        }

        let header = self.peek(0);
        if header != FRAME_HEADER {
            return Err(PartitionQueueError::CorruptHeader(header));
        }

        let available = self.used();
        if available < FRAME_OVERHEAD {
            return Err(PartitionQueueError::Truncated {
                expected: FRAME_OVERHEAD,
                available,
            });
        }

        let group = u16::from_le_bytes([self.peek(1), self.peek(2)]);
        let payload_len = usize::from(u16::from_le_bytes([self.peek(3), self.peek(4)]));
        let info = FrameInfo { group, payload_len };
        if available < info.encoded_len() {
            return Err(PartitionQueueError::Truncated {
                expected: info.encoded_len(),
                available,
            });
        }

        out.clear();
        out.extend((0..payload_len).map(|i| self.peek(FRAME_OVERHEAD + i)));
        self.read = (self.read + info.encoded_len()) % self.buf.len();
        Ok(Some(info))
    }

    /// Discard everything queued
    pub fn flush(&mut self) {
        self.read = self.write;
    }

    fn peek(&self, offset: usize) -> u8 {
        self.buf[(self.read + offset) % self.buf.len()]
    }

    fn put(&mut self, bytes: &[u8]) {
        let n = self.buf.len();
        let first = bytes.len().min(n - self.write);
        self.buf[self.write..self.write + first].copy_from_slice(&bytes[..first]);
        self.buf[..bytes.len() - first].copy_from_slice(&bytes[first..]);
        self.write = (self.write + bytes.len()) % n;
    }
}
