//! Error types for bit-range access

use thiserror::Error;

/// Errors that can occur while reading, writing or copying a bit range
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConvError {
    /// Range with zero bits
    #[error("bit range is empty")]
    EmptyRange,

    /// Range needs more bytes than the buffer holds
    #[error("bit range out of bounds: needs {required} bytes, buffer has {available}")]
    OutOfBounds { required: usize, available: usize },

    /// Range wider than 64 bits that does not cover whole bytes
    #[error("opaque range at bit {start_bit} with {length} bits is not byte aligned")]
    UnalignedOpaque { start_bit: u16, length: u16 },

    /// Source and destination ranges differ in width
    #[error("bit length mismatch: source {source_bits}, destination {destination_bits}")]
    LengthMismatch {
        source_bits: u16,
        destination_bits: u16,
    },
}

/// Result type for bit-range operations
pub type ConvResult<T> = Result<T, ConvError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ConvError::OutOfBounds {
            required: 4,
            available: 2,
        };
        assert_eq!(
            err.to_string(),
            "bit range out of bounds: needs 4 bytes, buffer has 2"
        );

        let err = ConvError::UnalignedOpaque {
            start_bit: 3,
            length: 72,
        };
        assert!(err.to_string().contains("not byte aligned"));
    }
}
