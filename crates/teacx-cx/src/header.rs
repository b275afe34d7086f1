//! CX file header.

use teacx_common::{BinaryCodec, BinaryReader, ResourceHeader};

use crate::{Error, Result};

/// Header preceding the root node of a CX file.
///
/// Wire layout:
///
/// | Field | Encoding |
/// |-------|----------|
/// | `version` | 2-byte integer |
/// | `resource` | 32-byte [`ResourceHeader`] |
/// | `original_file_path` | string |
/// | `build_number` | 4-byte integer |
/// | `header_text` | string |
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CxHeader {
    /// Format version.
    pub version: u16,
    /// Digest pair.
    pub resource: ResourceHeader,
    /// Path of the markup file the resource was built from.
    pub original_file_path: String,
    /// Build number of the tool that wrote the file.
    pub build_number: u32,
    /// Free-form header text.
    pub header_text: String,
}

impl BinaryCodec for CxHeader {
    type Error = Error;

    fn decode(reader: &mut BinaryReader<'_>) -> Result<Self> {
        Ok(Self {
            version: reader.read_u16()?,
            resource: ResourceHeader::decode(reader)?,
            original_file_path: reader.read_string()?,
            build_number: reader.read_u32()?,
            header_text: reader.read_string()?,
        })
    }

    fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        self.version.encode(out)?;
        self.resource.encode(out)?;
        self.original_file_path.encode(out)?;
        self.build_number.encode(out)?;
        self.header_text.encode(out)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use teacx_common::digest::digest;

    #[test]
    fn test_round_trip() {
        let header = CxHeader {
            version: 3,
            resource: ResourceHeader::generate_from("<a/>"),
            original_file_path: "library/ui/menu.xml".to_string(),
            build_number: 123,
            header_text: "generated".to_string(),
        };

        let bytes = header.to_bytes().unwrap();
        assert_eq!(&bytes[..2], &[3, 0]);
        assert_eq!(&bytes[2..18], digest("<a/>").as_bytes());
        assert_eq!(CxHeader::from_bytes(&bytes).unwrap(), header);
    }

    #[test]
    fn test_truncated_in_resource_header() {
        let err = CxHeader::from_bytes(&[3, 0, 1, 2, 3]).unwrap_err();
        assert!(err.is_truncated());
    }
}
