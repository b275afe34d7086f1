//! Resource header: the digest pair preceding structural content.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::digest::{digest, Digest};
use crate::{BinaryCodec, BinaryReader, Error};

/// The 32-byte resource header.
///
/// Mostly a black box: the source digest can be regenerated from the authored
/// text, the definition digest cannot and is written as zeros for new content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(C)]
pub struct ResourceHeader {
    /// Digest of the authored source text.
    pub source_digest: Digest,
    /// Digest of the resource definition (generation unknown).
    pub definition_digest: Digest,
}

impl ResourceHeader {
    /// Size of the header on the wire.
    pub const SIZE: usize = std::mem::size_of::<Self>();

    /// Create a header from its two digests.
    pub const fn new(source_digest: Digest, definition_digest: Digest) -> Self {
        Self {
            source_digest,
            definition_digest,
        }
    }

    /// Generate a header for newly authored source text.
    pub fn generate_from(source: &str) -> Self {
        Self {
            source_digest: digest(source),
            definition_digest: Digest::ZERO,
        }
    }
}

impl BinaryCodec for ResourceHeader {
    type Error = Error;

    fn decode(reader: &mut BinaryReader<'_>) -> Result<Self, Error> {
        reader.read_struct()
    }

    fn encode(&self, out: &mut Vec<u8>) -> Result<(), Error> {
        out.extend_from_slice(self.as_bytes());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size() {
        assert_eq!(ResourceHeader::SIZE, 32);
    }

    #[test]
    fn test_layout() {
        let mut raw = [0u8; 32];
        raw[0] = 0xAA;
        raw[16] = 0xBB;

        let header = ResourceHeader::from_bytes(&raw).unwrap();
        assert_eq!(header.source_digest.as_bytes()[0], 0xAA);
        assert_eq!(header.definition_digest.as_bytes()[0], 0xBB);
        assert_eq!(header.to_bytes().unwrap(), raw.to_vec());
    }

    #[test]
    fn test_generate_from() {
        let header = ResourceHeader::generate_from("<a x=\"1\"/>");
        assert_eq!(header.source_digest, digest("<a x=\"1\"/>"));
        assert!(header.definition_digest.is_zero());
    }

    #[test]
    fn test_truncated() {
        assert!(matches!(
            ResourceHeader::from_bytes(&[0u8; 20]),
            Err(Error::TruncatedInput { needed: 32, available: 20, .. })
        ));
    }
}
