//! comgw-conv - Bit-range primitives for PDU gatewaying
//!
//! A small library for locating and moving signal bits inside fixed-format
//! PDU buffers, independent of any signal database.
//!
//! # Features
//!
//! - **Both byte orders** - little-endian (Intel) and big-endian (Motorola,
//!   sawtooth numbering) ranges
//! - **Cross-order copy** - source and destination may differ in byte order
//! - **Change detection** - a copy reports whether the destination changed
//! - **Update bits** - the shared "is this value fresh" rule
//!
//! # Quick Start
//!
//! ```rust
//! use comgw_conv::{copy_bits, BitRange, UpdateBit};
//!
//! let received = [0x2A, 0x80];
//! let mut tx_buffer = [0u8; 4];
//!
//! // Only copy when the update bit (bit 15) is set
//! if UpdateBit::at_bit(15).is_updated(&received) {
//!     let changed = copy_bits(
//!         &received,
//!         BitRange::little(0, 8),
//!         &mut tx_buffer,
//!         BitRange::big(23, 8),
//!     )
//!     .unwrap();
//!     assert!(changed);
//! }
//! assert_eq!(tx_buffer, [0x00, 0x00, 0x2A, 0x00]);
//! ```

pub mod copy;
pub mod error;
pub mod types;

pub use copy::{copy_bits, read_bits, write_bits};
pub use error::{ConvError, ConvResult};
pub use types::{BitRange, ByteOrder, UpdateBit};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::copy::copy_bits;
    pub use crate::error::{ConvError, ConvResult};
    pub use crate::types::{BitRange, ByteOrder, UpdateBit};
}
