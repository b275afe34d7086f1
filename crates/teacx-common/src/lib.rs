//! Common building blocks for Tea for God binary resources.
//!
//! Every binary resource written by the engine's tooling is assembled from the
//! same pieces, provided here:
//!
//! - [`primitive`] - fixed-width integers, booleans and length-prefixed strings
//! - [`BinaryReader`] - zero-copy cursor that reads those primitives
//! - [`BinaryCodec`] - the decode/encode pair implemented by every structure
//! - [`ResourceHeader`] and [`digest`] - the digest block that precedes content

mod codec;
mod error;
mod reader;
mod resource;

pub mod digest;
pub mod primitive;

pub use codec::BinaryCodec;
pub use digest::Digest;
pub use error::{Error, Result};
pub use primitive::Endian;
pub use reader::BinaryReader;
pub use resource::ResourceHeader;

/// Re-export zerocopy traits for convenience
pub use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Re-export memchr for fast byte searching
pub use memchr;
