//! Reading, writing and copying bit ranges
//!
//! Ranges up to 64 bits are moved through a `u64` so that source and
//! destination may use different byte orders. Wider ranges must cover whole
//! bytes and are copied verbatim.

use crate::error::{ConvError, ConvResult};
use crate::types::BitRange;

/// Read a range of up to 64 bits as an unsigned value
pub fn read_bits(data: &[u8], range: BitRange) -> ConvResult<u64> {
    check_scalar(data.len(), range)?;
    let value = range.positions().fold(0u64, |acc, bit| {
        (acc << 1) | u64::from((data[bit / 8] >> (bit % 8)) & 1)
    });
    Ok(value)
}

/// Write the low `range.length` bits of `value` into `data`
///
/// Bits outside the range are left untouched.
pub fn write_bits(data: &mut [u8], range: BitRange, value: u64) -> ConvResult<()> {
    check_scalar(data.len(), range)?;
    let length = u32::from(range.length);
    for (i, bit) in range.positions().enumerate() {
        let shift = length - 1 - i as u32;
        let mask = 1u8 << (bit % 8);
        if (value >> shift) & 1 == 1 {
            data[bit / 8] |= mask;
        } else {
            data[bit / 8] &= !mask;
        }
    }
    Ok(())
}

/// Copy `src_range` of `src` into `dst_range` of `dst`.
///
/// The destination is always written. Returns whether any destination bit
/// changed.
pub fn copy_bits(
    src: &[u8],
    src_range: BitRange,
    dst: &mut [u8],
    dst_range: BitRange,
) -> ConvResult<bool> {
    if src_range.length != dst_range.length {
        return Err(ConvError::LengthMismatch {
            source_bits: src_range.length,
            destination_bits: dst_range.length,
        });
    }

    if src_range.is_opaque() {
        return copy_opaque(src, src_range, dst, dst_range);
    }

    let value = read_bits(src, src_range)?;
    let previous = read_bits(dst, dst_range)?;
    write_bits(dst, dst_range, value)?;
    Ok(previous != value)
}

fn copy_opaque(
    src: &[u8],
    src_range: BitRange,
    dst: &mut [u8],
    dst_range: BitRange,
) -> ConvResult<bool> {
    let src_bytes = aligned(src.len(), src_range)?;
    let dst_bytes = aligned(dst.len(), dst_range)?;

    let source = &src[src_bytes];
    let target = &mut dst[dst_bytes];
    let changed = source != &target[..];
    target.copy_from_slice(source);
    Ok(changed)
}

fn aligned(len: usize, range: BitRange) -> ConvResult<std::ops::Range<usize>> {
    let bytes = range.aligned_bytes().ok_or(ConvError::UnalignedOpaque {
        start_bit: range.start_bit,
        length: range.length,
    })?;
    if bytes.end > len {
        return Err(ConvError::OutOfBounds {
            required: bytes.end,
            available: len,
        });
    }
    Ok(bytes)
}

fn check_scalar(len: usize, range: BitRange) -> ConvResult<()> {
    if range.length == 0 {
        return Err(ConvError::EmptyRange);
    }
    if range.is_opaque() {
        return Err(ConvError::UnalignedOpaque {
            start_bit: range.start_bit,
            length: range.length,
        });
    }
    let required = range.bytes_required();
    if required > len {
        return Err(ConvError::OutOfBounds {
            required,
            available: len,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_read_little_endian() {
        let data = [0x34, 0x12];
        assert_eq!(read_bits(&data, BitRange::little(0, 16)).unwrap(), 0x1234);
        assert_eq!(read_bits(&data, BitRange::little(4, 8)).unwrap(), 0x23);
        assert_eq!(read_bits(&data, BitRange::little(2, 1)).unwrap(), 1);
    }

    #[test]
    fn test_read_big_endian() {
        let data = [0x12, 0x34];
        assert_eq!(read_bits(&data, BitRange::big(7, 16)).unwrap(), 0x1234);
        // Upper nibble of byte 0
        assert_eq!(read_bits(&data, BitRange::big(7, 4)).unwrap(), 0x1);
        // Low nibble of byte 0 followed by high nibble of byte 1
        assert_eq!(read_bits(&data, BitRange::big(3, 8)).unwrap(), 0x23);
    }

    #[test]
    fn test_write_preserves_neighbours() {
        let mut data = [0xFF, 0xFF];
        write_bits(&mut data, BitRange::little(4, 8), 0x00).unwrap();
        assert_eq!(data, [0x0F, 0xF0]);

        let mut data = [0x00, 0x00];
        write_bits(&mut data, BitRange::big(3, 8), 0xA5).unwrap();
        assert_eq!(data, [0x0A, 0x50]);
    }

    #[test]
    fn test_read_out_of_bounds() {
        let err = read_bits(&[0x00], BitRange::little(4, 8)).unwrap_err();
        assert_eq!(
            err,
            ConvError::OutOfBounds {
                required: 2,
                available: 1
            }
        );
        assert_eq!(
            read_bits(&[0x00], BitRange::little(0, 0)).unwrap_err(),
            ConvError::EmptyRange
        );
    }

    #[test]
    fn test_copy_reports_change() {
        let mut dst = [0x00u8; 2];
        let changed = copy_bits(&[0x00], BitRange::little(0, 8), &mut dst, BitRange::little(8, 8))
            .unwrap();
        assert!(!changed);

        let changed = copy_bits(&[0x01], BitRange::little(0, 8), &mut dst, BitRange::little(8, 8))
            .unwrap();
        assert!(changed);
        assert_eq!(dst, [0x00, 0x01]);

        // Same value again: destination written but unchanged
        let changed = copy_bits(&[0x01], BitRange::little(0, 8), &mut dst, BitRange::little(8, 8))
            .unwrap();
        assert!(!changed);
    }

    #[test]
    fn test_copy_converts_byte_order() {
        let src = [0x34, 0x12];
        let mut dst = [0u8; 3];
        copy_bits(&src, BitRange::little(0, 16), &mut dst, BitRange::big(15, 16)).unwrap();
        assert_eq!(dst, [0x00, 0x12, 0x34]);
    }

    #[test]
    fn test_copy_opaque() {
        let src: Vec<u8> = (0u8..12).collect();
        let mut dst = vec![0u8; 12];
        let changed = copy_bits(&src, BitRange::little(8, 80), &mut dst, BitRange::little(16, 80))
            .unwrap();
        assert!(changed);
        assert_eq!(&dst[2..12], &src[1..11]);

        let err = copy_bits(&src, BitRange::little(4, 80), &mut dst, BitRange::little(16, 80))
            .unwrap_err();
        assert!(matches!(err, ConvError::UnalignedOpaque { .. }));
    }

    #[test]
    fn test_copy_length_mismatch() {
        let mut dst = [0u8; 2];
        let err = copy_bits(&[0xFF], BitRange::little(0, 8), &mut dst, BitRange::little(0, 4))
            .unwrap_err();
        assert_eq!(
            err,
            ConvError::LengthMismatch {
                source_bits: 8,
                destination_bits: 4
            }
        );
    }
}
