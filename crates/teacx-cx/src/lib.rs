//! CX binary markup codec for Tea for God resources.
//!
//! A CX file is a compiled markup document: a small header followed by a tree
//! of nodes (elements, text, comments and commented-out elements), all built
//! from the primitives in [`teacx_common`]. This crate decodes and encodes the
//! binary form and projects it onto markup text and structured records.
//!
//! # Example
//!
//! ```no_run
//! use teacx_cx::{decode_file, encode_file};
//!
//! let data = std::fs::read("menu.cx")?;
//! let file = decode_file(&data)?;
//!
//! # #[cfg(feature = "xml-output")]
//! println!("{}", teacx_cx::to_markup(&file)?);
//!
//! assert_eq!(encode_file(&file)?, data);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Features
//!
//! - `xml-output` (default) - markup rendering and parsing via quick-xml
//! - `json-output` (default) - structured records via serde_json

mod attribute;
mod error;
mod file;
mod header;
mod node;
mod node_type;

pub mod names;

#[cfg(feature = "xml-output")]
mod from_markup;
#[cfg(feature = "xml-output")]
pub mod markup;
#[cfg(feature = "json-output")]
pub mod record;

pub use attribute::Attribute;
pub use error::{Error, Result};
pub use file::CxFile;
pub use header::CxHeader;
pub use node::{Descendants, Node};
pub use node_type::NodeType;

#[cfg(feature = "xml-output")]
pub use from_markup::{from_markup, parse_markup};
#[cfg(feature = "xml-output")]
pub use markup::{to_markup, MarkupOptions, MarkupWriter};
#[cfg(feature = "json-output")]
pub use record::{from_record, to_record, CxRecord};

/// Decode a CX file from bytes.
pub fn decode_file(data: &[u8]) -> Result<CxFile> {
    CxFile::read_from_bytes(data)
}

/// Encode a CX file to bytes.
pub fn encode_file(file: &CxFile) -> Result<Vec<u8>> {
    file.write_to_bytes()
}
