//! Zero-copy cursor over TEA resource bytes.

use zerocopy::FromBytes;

use crate::primitive::{self, Endian, BOOL_WIDTH};
use crate::{Error, Result};

/// Cursor over the bytes of one TEA resource.
///
/// Every read either consumes exactly the bytes it declares or fails with
/// [`Error::TruncatedInput`] and leaves the position untouched.
///
/// # Example
///
/// ```
/// use teacx_common::BinaryReader;
///
/// let data = [0x03, 0x00, 0x7b, 0x00, 0x00, 0x00];
/// let mut reader = BinaryReader::new(&data);
///
/// assert_eq!(reader.read_u16().unwrap(), 3);
/// assert_eq!(reader.read_u32().unwrap(), 123);
/// assert!(reader.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct BinaryReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> BinaryReader<'a> {
    #[inline]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    /// Byte offset of the next read.
    #[inline]
    pub const fn position(&self) -> usize {
        self.offset
    }

    /// Bytes left after the current offset.
    #[inline]
    pub const fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.offset)
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Borrow the next `count` bytes, failing if the input ends first.
    fn window(&self, count: usize) -> Result<&'a [u8]> {
        let available = self.remaining();
        if available < count {
            return Err(Error::TruncatedInput {
                needed: count,
                available,
                position: self.offset,
            });
        }
        Ok(&self.data[self.offset..self.offset + count])
    }

    /// Consume `count` raw bytes.
    #[inline]
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        let window = self.window(count)?;
        self.offset += count;
        Ok(window)
    }

    /// Read an unsigned little-endian slot of `width` bytes.
    pub fn read_uint(&mut self, width: usize) -> Result<u64> {
        let value = primitive::decode_uint(self.window(width)?, Endian::Little)?;
        self.offset += width;
        Ok(value)
    }

    #[inline]
    pub fn read_u16(&mut self) -> Result<u16> {
        self.read_uint(2).map(|v| v as u16)
    }

    #[inline]
    pub fn read_u32(&mut self) -> Result<u32> {
        self.read_uint(4).map(|v| v as u32)
    }

    /// Read a 1-byte boolean slot. Only 1 is true.
    #[inline]
    pub fn read_bool(&mut self) -> Result<bool> {
        primitive::decode_bool(self.read_bytes(BOOL_WIDTH)?)
    }

    /// Read `length` bytes of UTF-8 text.
    pub fn read_str(&mut self, length: usize) -> Result<&'a str> {
        let text = std::str::from_utf8(self.window(length)?)?;
        self.offset += length;
        Ok(text)
    }

    /// Read a flagged, length-prefixed string.
    #[inline]
    pub fn read_string(&mut self) -> Result<String> {
        primitive::decode_string(self)
    }

    /// Read a fixed-layout block such as [`crate::ResourceHeader`].
    pub fn read_struct<T: FromBytes>(&mut self) -> Result<T> {
        let size = std::mem::size_of::<T>();
        let value = T::read_from_bytes(self.window(size)?).map_err(|_| Error::TruncatedInput {
            needed: size,
            available: self.remaining(),
            position: self.offset,
        })?;
        self.offset += size;
        Ok(value)
    }
}
