//! Queue errors

use thiserror::Error;

/// Errors from [`BoundedRingQueue`](crate::BoundedRingQueue)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    /// No free slot left
    #[error("event queue full")]
    Full,

    /// A stored handle is outside the table the queue serves
    #[error("queued handle {handle} outside table of {limit} entries")]
    HandleOutOfRange { handle: u16, limit: u16 },
}

/// Errors from [`CrossPartitionQueue`](crate::CrossPartitionQueue)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PartitionQueueError {
    /// Frame does not fit into the free space
    #[error("cross-partition queue full: frame needs {needed} bytes, {free} free")]
    Full { needed: usize, free: usize },

    /// Payload longer than a frame can describe
    #[error("payload of {0} bytes exceeds frame limit")]
    PayloadTooLarge(usize),

    /// Byte at the read cursor is not a frame header
    #[error("invalid frame header 0x{0:02X}")]
    CorruptHeader(u8),

    /// Header announces more bytes than are queued
    #[error("truncated frame: {expected} bytes announced, {available} queued")]
    Truncated { expected: usize, available: usize },
}
