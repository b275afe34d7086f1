//! Fixed-width integer, boolean and string encodings.
//!
//! Every TEA binary format is built from three primitives:
//!
//! - integers stored in a fixed-width slot (1 to 8 bytes),
//! - booleans stored as a 1-byte integer,
//! - strings stored as `[narrow flag][4-byte length][bytes]`.
//!
//! Integer slots are decoded with their trailing zero bytes stripped before the
//! remaining bytes are interpreted. For little-endian unsigned slots (the only
//! kind the formats actually store) this is value-identical to a plain read.
//! Signed and big-endian slots keep the same stripping rule, so values whose
//! top byte is zero are read back from the shorter slice.

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::{BinaryReader, Error, Result};

/// Largest supported integer slot, in bytes.
pub const MAX_INT_WIDTH: usize = 8;

/// Width of a boolean slot.
pub const BOOL_WIDTH: usize = 1;

/// Width of the length prefix of a string.
pub const STRING_LENGTH_WIDTH: usize = 4;

/// Byte order of an integer slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endian {
    /// Least significant byte first.
    #[default]
    Little,
    /// Most significant byte first.
    Big,
}

#[inline]
fn check_width(width: usize) -> Result<()> {
    if width == 0 || width > MAX_INT_WIDTH {
        return Err(Error::InvalidWidth(width));
    }
    Ok(())
}

/// The slot with its trailing zero bytes removed.
#[inline]
fn significant(bytes: &[u8]) -> &[u8] {
    let end = bytes.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    &bytes[..end]
}

/// Decode an unsigned integer slot. The slot width is `bytes.len()`.
pub fn decode_uint(bytes: &[u8], endian: Endian) -> Result<u64> {
    check_width(bytes.len())?;
    let bytes = significant(bytes);
    if bytes.is_empty() {
        return Ok(0);
    }
    Ok(match endian {
        Endian::Little => LittleEndian::read_uint(bytes, bytes.len()),
        Endian::Big => BigEndian::read_uint(bytes, bytes.len()),
    })
}

/// Decode a signed integer slot. The slot width is `bytes.len()`.
///
/// The sign is taken from the last significant byte, not from the full slot.
pub fn decode_sint(bytes: &[u8], endian: Endian) -> Result<i64> {
    check_width(bytes.len())?;
    let bytes = significant(bytes);
    if bytes.is_empty() {
        return Ok(0);
    }
    Ok(match endian {
        Endian::Little => LittleEndian::read_int(bytes, bytes.len()),
        Endian::Big => BigEndian::read_int(bytes, bytes.len()),
    })
}

/// Append an unsigned integer as a `width`-byte slot.
pub fn write_uint(out: &mut Vec<u8>, value: u64, width: usize, endian: Endian) -> Result<()> {
    check_width(width)?;
    if width < MAX_INT_WIDTH && value >> (width * 8) != 0 {
        return Err(Error::ValueOutOfRange {
            value: value as i128,
            width,
            kind: "unsigned",
        });
    }

    let mut slot = [0u8; MAX_INT_WIDTH];
    match endian {
        Endian::Little => LittleEndian::write_uint(&mut slot[..width], value, width),
        Endian::Big => BigEndian::write_uint(&mut slot[..width], value, width),
    }
    out.extend_from_slice(&slot[..width]);
    Ok(())
}

/// Append a signed integer as a `width`-byte two's complement slot.
pub fn write_sint(out: &mut Vec<u8>, value: i64, width: usize, endian: Endian) -> Result<()> {
    check_width(width)?;
    let bits = width as u32 * 8;
    let min = -(1i128 << (bits - 1));
    let max = (1i128 << (bits - 1)) - 1;
    if (value as i128) < min || (value as i128) > max {
        return Err(Error::ValueOutOfRange {
            value: value as i128,
            width,
            kind: "signed",
        });
    }

    let mut slot = [0u8; MAX_INT_WIDTH];
    match endian {
        Endian::Little => LittleEndian::write_int(&mut slot[..width], value, width),
        Endian::Big => BigEndian::write_int(&mut slot[..width], value, width),
    }
    out.extend_from_slice(&slot[..width]);
    Ok(())
}

/// Encode an unsigned integer as a `width`-byte slot.
pub fn encode_uint(value: u64, width: usize, endian: Endian) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(width);
    write_uint(&mut out, value, width, endian)?;
    Ok(out)
}

/// Encode a signed integer as a `width`-byte slot.
pub fn encode_sint(value: i64, width: usize, endian: Endian) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(width);
    write_sint(&mut out, value, width, endian)?;
    Ok(out)
}

/// Decode a boolean slot. Only the value 1 is true.
pub fn decode_bool(bytes: &[u8]) -> Result<bool> {
    Ok(decode_uint(bytes, Endian::Little)? == 1)
}

/// Encode a boolean as a 1-byte slot.
#[inline]
pub fn encode_bool(value: bool) -> [u8; BOOL_WIDTH] {
    [value as u8]
}

/// Read a length-prefixed string.
///
/// A zero length yields an empty string without looking at the narrow flag.
pub fn decode_string(reader: &mut BinaryReader<'_>) -> Result<String> {
    let narrow = reader.read_bool()?;
    let length = reader.read_uint(STRING_LENGTH_WIDTH)? as u32;
    if length == 0 {
        return Ok(String::new());
    }
    if !narrow {
        return Err(Error::UnsupportedEncoding { length });
    }
    Ok(reader.read_str(length as usize)?.to_owned())
}

/// Append a narrow string with its flag and length prefix.
pub fn write_string(out: &mut Vec<u8>, value: &str) -> Result<()> {
    out.extend_from_slice(&encode_bool(true));
    write_uint(out, value.len() as u64, STRING_LENGTH_WIDTH, Endian::Little)?;
    out.extend_from_slice(value.as_bytes());
    Ok(())
}

/// Encode a narrow string with its flag and length prefix.
pub fn encode_string(value: &str) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(1 + STRING_LENGTH_WIDTH + value.len());
    write_string(&mut out, value)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_all_zero_slot() {
        assert_eq!(decode_uint(&[0, 0, 0, 0], Endian::Little).unwrap(), 0);
        assert_eq!(decode_sint(&[0, 0], Endian::Big).unwrap(), 0);
    }

    #[test]
    fn test_little_endian_slot() {
        assert_eq!(decode_uint(&[0x7b, 0, 0, 0], Endian::Little).unwrap(), 123);
        assert_eq!(decode_uint(&[0x01, 0x02, 0, 0], Endian::Little).unwrap(), 0x0201);
        assert_eq!(encode_uint(123, 4, Endian::Little).unwrap(), vec![0x7b, 0, 0, 0]);
    }

    #[test]
    fn test_trailing_zeros_are_stripped_before_decoding() {
        // Big-endian 0x0100 loses its low zero byte and reads back as 1.
        assert_eq!(decode_uint(&[0x01, 0x00], Endian::Big).unwrap(), 1);
        // Signed 0x00FF reads as a 1-byte -1.
        assert_eq!(decode_sint(&[0xFF, 0x00], Endian::Little).unwrap(), -1);
        assert_eq!(decode_sint(&[0xFE, 0xFF], Endian::Little).unwrap(), -2);
    }

    #[test]
    fn test_encode_keeps_width() {
        assert_eq!(encode_uint(0, 2, Endian::Little).unwrap(), vec![0, 0]);
        assert_eq!(encode_uint(1, 2, Endian::Big).unwrap(), vec![0, 1]);
        assert_eq!(encode_sint(-1, 4, Endian::Little).unwrap(), vec![0xFF; 4]);
    }

    #[test]
    fn test_out_of_range() {
        assert!(matches!(
            encode_uint(256, 1, Endian::Little),
            Err(Error::ValueOutOfRange { width: 1, .. })
        ));
        assert!(matches!(
            encode_sint(128, 1, Endian::Little),
            Err(Error::ValueOutOfRange { .. })
        ));
        assert!(encode_sint(-128, 1, Endian::Little).is_ok());
    }

    #[test]
    fn test_invalid_width() {
        assert!(matches!(decode_uint(&[], Endian::Little), Err(Error::InvalidWidth(0))));
        assert!(matches!(encode_uint(1, 9, Endian::Little), Err(Error::InvalidWidth(9))));
    }

    #[test]
    fn test_bool() {
        assert!(decode_bool(&[1]).unwrap());
        assert!(!decode_bool(&[0]).unwrap());
        assert!(!decode_bool(&[2]).unwrap());
        assert_eq!(encode_bool(true), [1]);
    }

    #[test]
    fn test_empty_string() {
        let bytes = encode_string("").unwrap();
        assert_eq!(bytes, vec![1, 0, 0, 0, 0]);

        let mut reader = BinaryReader::new(&bytes);
        assert_eq!(decode_string(&mut reader).unwrap(), "");
        assert!(reader.is_empty());
    }

    #[test]
    fn test_string() {
        let bytes = encode_string("héllo").unwrap();
        assert_eq!(&bytes[..5], &[1, 6, 0, 0, 0]);

        let mut reader = BinaryReader::new(&bytes);
        assert_eq!(decode_string(&mut reader).unwrap(), "héllo");
        assert!(reader.is_empty());
    }

    #[test]
    fn test_wide_string_is_unsupported() {
        let mut reader = BinaryReader::new(&[0, 2, 0, 0, 0, b'h', 0]);
        assert!(matches!(
            decode_string(&mut reader),
            Err(Error::UnsupportedEncoding { length: 2 })
        ));
    }

    #[test]
    fn test_empty_wide_string_decodes() {
        let mut reader = BinaryReader::new(&[0, 0, 0, 0, 0]);
        assert_eq!(decode_string(&mut reader).unwrap(), "");
    }

    #[test]
    fn test_truncated_string() {
        let mut reader = BinaryReader::new(&[1, 5, 0, 0, 0, b'a', b'b']);
        assert!(matches!(
            decode_string(&mut reader),
            Err(Error::TruncatedInput { needed: 5, available: 2, position: 5 })
        ));
    }

    proptest! {
        #[test]
        fn prop_uint_round_trip(width in 1usize..=8, raw in any::<u64>()) {
            let value = if width == 8 { raw } else { raw & ((1u64 << (width * 8)) - 1) };
            let bytes = encode_uint(value, width, Endian::Little).unwrap();
            prop_assert_eq!(bytes.len(), width);
            prop_assert_eq!(decode_uint(&bytes, Endian::Little).unwrap(), value);
        }
    }
}
