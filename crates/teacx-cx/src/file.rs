//! CX file: header plus root node.

use std::fs;
use std::path::Path;

use teacx_common::{BinaryCodec, BinaryReader};
use tracing::{debug, warn};

use crate::{CxHeader, Error, Node, NodeType, Result};

/// A decoded CX file.
///
/// The root is normally a [`NodeType::RootVirtual`] node wrapping the document
/// element, but decoding does not insist on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CxFile {
    /// File header.
    pub header: CxHeader,
    /// Root of the node tree.
    pub root: Node,
}

impl CxFile {
    /// Create a file from a header and a root node.
    pub fn new(header: CxHeader, root: Node) -> Self {
        Self { header, root }
    }

    /// Decode a CX file from bytes. Trailing bytes after the root are ignored.
    pub fn read_from_bytes(data: &[u8]) -> Result<Self> {
        let mut reader = BinaryReader::new(data);
        let file = Self::decode(&mut reader)?;

        if !reader.is_empty() {
            warn!(
                trailing = reader.remaining(),
                "ignoring bytes after the root node"
            );
        }

        Ok(file)
    }

    /// Read and decode a CX file from disk.
    pub fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path)?;
        debug!(path = %path.display(), size = data.len(), "read CX file");
        Self::read_from_bytes(&data)
    }

    /// Encode the file to bytes.
    pub fn write_to_bytes(&self) -> Result<Vec<u8>> {
        self.to_bytes()
    }

    /// Encode the file and write it to disk.
    pub fn write_to_path<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = self.write_to_bytes()?;
        fs::write(path, bytes)?;
        Ok(())
    }
}

impl BinaryCodec for CxFile {
    type Error = Error;

    fn decode(reader: &mut BinaryReader<'_>) -> Result<Self> {
        let header = CxHeader::decode(reader)?;
        let root = Node::decode(reader)?;

        if root.node_type != NodeType::RootVirtual {
            warn!(node_type = %root.node_type, "root node is not a virtual root");
        }
        debug!(
            version = header.version,
            build = header.build_number,
            nodes = root.descendant_count(),
            "decoded CX file"
        );

        Ok(Self { header, root })
    }

    fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        let start = out.len();
        self.header.encode(out)?;
        self.root.encode(out)?;
        debug!(size = out.len() - start, "encoded CX file");
        Ok(())
    }
}
