//! The [`BinaryCodec`] trait shared by every serialisable TEA structure.

use crate::primitive::{self, Endian};
use crate::{BinaryReader, Error};

/// A value with a fixed binary wire layout.
///
/// Decoding consumes exactly the bytes of one value from the reader; encoding
/// appends the same layout to a buffer. Structures built on top of the
/// primitives implement this with their own error type, which only has to be
/// constructible from the common [`Error`].
pub trait BinaryCodec: Sized {
    /// Error produced by this codec.
    type Error: From<Error>;

    /// Decode one value from the reader.
    fn decode(reader: &mut BinaryReader<'_>) -> Result<Self, Self::Error>;

    /// Append the encoded value to `out`.
    fn encode(&self, out: &mut Vec<u8>) -> Result<(), Self::Error>;

    /// Decode one value from the start of a byte slice.
    fn from_bytes(data: &[u8]) -> Result<Self, Self::Error> {
        let mut reader = BinaryReader::new(data);
        Self::decode(&mut reader)
    }

    /// Encode into a fresh buffer.
    fn to_bytes(&self) -> Result<Vec<u8>, Self::Error> {
        let mut out = Vec::new();
        self.encode(&mut out)?;
        Ok(out)
    }
}

impl BinaryCodec for bool {
    type Error = Error;

    fn decode(reader: &mut BinaryReader<'_>) -> Result<Self, Error> {
        reader.read_bool()
    }

    fn encode(&self, out: &mut Vec<u8>) -> Result<(), Error> {
        out.extend_from_slice(&primitive::encode_bool(*self));
        Ok(())
    }
}

impl BinaryCodec for u16 {
    type Error = Error;

    fn decode(reader: &mut BinaryReader<'_>) -> Result<Self, Error> {
        reader.read_u16()
    }

    fn encode(&self, out: &mut Vec<u8>) -> Result<(), Error> {
        primitive::write_uint(out, u64::from(*self), 2, Endian::Little)
    }
}

impl BinaryCodec for u32 {
    type Error = Error;

    fn decode(reader: &mut BinaryReader<'_>) -> Result<Self, Error> {
        reader.read_u32()
    }

    fn encode(&self, out: &mut Vec<u8>) -> Result<(), Error> {
        primitive::write_uint(out, u64::from(*self), 4, Endian::Little)
    }
}

impl BinaryCodec for String {
    type Error = Error;

    fn decode(reader: &mut BinaryReader<'_>) -> Result<Self, Error> {
        reader.read_string()
    }

    fn encode(&self, out: &mut Vec<u8>) -> Result<(), Error> {
        primitive::write_string(out, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_u32_layout() {
        assert_eq!(123u32.to_bytes().unwrap(), vec![0x7b, 0, 0, 0]);
        assert_eq!(u32::from_bytes(&[0x7b, 0, 0, 0]).unwrap(), 123);
    }

    #[test]
    fn test_u16_layout() {
        assert_eq!(3u16.to_bytes().unwrap(), vec![3, 0]);
        assert_eq!(u16::from_bytes(&[0, 1]).unwrap(), 256);
    }

    #[test]
    fn test_string_round_trip() {
        let value = "Library/Basics/ui.xml".to_string();
        let bytes = value.to_bytes().unwrap();
        assert_eq!(String::from_bytes(&bytes).unwrap(), value);
    }

    #[test]
    fn test_truncated() {
        assert!(matches!(
            u32::from_bytes(&[1, 2, 3]),
            Err(Error::TruncatedInput { needed: 4, .. })
        ));
    }
}
