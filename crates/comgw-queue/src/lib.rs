//! comgw-queue - Bounded queues for deferred PDU processing
//!
//! Plain data structures shared by the receive dispatcher and the gateway.
//! None of them lock: every instance lives inside its owner's critical
//! section, and all storage is sized once at construction.
//!
//! - [`BoundedRingQueue`] - FIFO of PDU handles that arrived since the last task run
//! - [`NotifyCache`] - notifications collected under a lock, fired after release
//! - [`CrossPartitionQueue`] - framed byte ring carrying gateway work across partitions

pub mod error;
pub mod notify_cache;
pub mod partition;
pub mod ring;

pub use error::{PartitionQueueError, QueueError};
pub use notify_cache::NotifyCache;
pub use partition::{CrossPartitionQueue, FrameInfo, FRAME_HEADER, FRAME_OVERHEAD};
pub use ring::BoundedRingQueue;
