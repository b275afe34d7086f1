//! 16-byte resource digests.
//!
//! Resource headers carry two opaque 16-byte digests. The source digest can be
//! regenerated from the authored source text with [`digest`], a rolling
//! non-cryptographic transform that matches the existing authoring tool. It is
//! not known to match the engine's own checksum bit for bit.

use std::fmt;
use std::str::FromStr;

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::Error;

/// Number of bytes in a digest.
pub const DIGEST_LEN: usize = 16;

/// Seed for the "previous byte" of the rolling transform (a carriage return).
const INITIAL_PREV: u8 = 13;

/// Bias subtracted from every input byte.
const BYTE_BIAS: u8 = 83;

/// A 16-byte opaque digest, displayed as 32 lower-case hex digits.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct Digest {
    bytes: [u8; DIGEST_LEN],
}

impl Digest {
    /// All-zero digest, used for the definition digest of new resources.
    pub const ZERO: Self = Self {
        bytes: [0; DIGEST_LEN],
    };

    /// Create a digest from raw bytes.
    #[inline]
    pub const fn from_bytes(bytes: [u8; DIGEST_LEN]) -> Self {
        Self { bytes }
    }

    /// Get the raw bytes of the digest.
    #[inline]
    pub const fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.bytes
    }

    /// Check if every byte is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.bytes == [0; DIGEST_LEN]
    }
}

/// Compute the source digest of an authored text.
pub fn digest(source: &str) -> Digest {
    digest_bytes(source.as_bytes())
}

/// Compute the source digest over raw UTF-8 bytes.
///
/// Only the first [`DIGEST_LEN`] bytes update the accumulator; later bytes
/// still advance the rolling state but leave the result unchanged.
pub fn digest_bytes(data: &[u8]) -> Digest {
    let mut value = [0u8; DIGEST_LEN];
    let mut index = 0;
    let mut prev = INITIAL_PREV;

    for (read_already, &byte) in data.iter().enumerate() {
        if read_already < DIGEST_LEN {
            value[index] = value[index]
                .wrapping_add(byte.wrapping_sub(BYTE_BIAS))
                .wrapping_add(prev & read_already as u8);
        }
        prev = byte;
        index = (index + 1) % DIGEST_LEN;
    }

    Digest::from_bytes(value)
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self)
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.bytes {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl FromStr for Digest {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != DIGEST_LEN * 2 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(Error::InvalidDigest(format!(
                "expected {} hex digits, got {:?}",
                DIGEST_LEN * 2,
                s
            )));
        }

        let mut bytes = [0u8; DIGEST_LEN];
        for (i, byte) in bytes.iter_mut().enumerate() {
            let pair = &s[i * 2..i * 2 + 2];
            *byte = u8::from_str_radix(pair, 16)
                .map_err(|_| Error::InvalidDigest(format!("invalid hex at position {}", i * 2)))?;
        }

        Ok(Self { bytes })
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Digest {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Digest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_source() {
        assert!(digest("").is_zero());
    }

    #[test]
    fn test_known_digests() {
        // 'A' - 83 wraps to 0xee; second byte adds (prev & 1).
        let d = digest("A");
        assert_eq!(d.as_bytes()[0], 0xee);
        assert!(d.as_bytes()[1..].iter().all(|&b| b == 0));

        let d = digest("AB");
        assert_eq!(&d.as_bytes()[..2], &[0xee, 0xf0]);
    }

    #[test]
    fn test_only_first_block_counts() {
        // 'S' is the bias, so only the (prev & count) term survives.
        let expected = [0, 1, 2, 3, 0, 1, 2, 3, 0, 1, 2, 3, 0, 1, 2, 3];
        assert_eq!(digest(&"S".repeat(16)).as_bytes(), &expected);
        assert_eq!(digest(&"S".repeat(40)).as_bytes(), &expected);
    }

    #[test]
    fn test_hex_round_trip() {
        let d = digest("<root/>");
        let text = d.to_string();
        assert_eq!(text.len(), 32);
        assert_eq!(text.parse::<Digest>().unwrap(), d);
        assert_eq!(Digest::ZERO.to_string(), "0".repeat(32));
    }

    #[test]
    fn test_invalid_hex() {
        assert!("abc".parse::<Digest>().is_err());
        assert!("zz".repeat(16).parse::<Digest>().is_err());
        assert!("é".repeat(16).parse::<Digest>().is_err());
        assert!("+f".repeat(16).parse::<Digest>().is_err());
        assert!(format!("+{}", "0".repeat(31)).parse::<Digest>().is_err());
    }
}
