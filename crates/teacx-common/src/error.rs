//! Error types for teacx-common.

use thiserror::Error;

/// Common error type for TEA binary primitives.
#[derive(Debug, Error)]
pub enum Error {
    /// The stream ended before a declared field could be fully read.
    #[error("truncated input at offset {position}: needed {needed} bytes but only {available} available")]
    TruncatedInput {
        needed: usize,
        available: usize,
        position: usize,
    },

    /// A string was stored with the wide (non 8-bit) encoding.
    #[error("unsupported string encoding: wide strings are not implemented (length {length})")]
    UnsupportedEncoding { length: u32 },

    /// An integer does not fit into its fixed-width slot.
    #[error("value {value} does not fit in a {width}-byte {kind} slot")]
    ValueOutOfRange {
        value: i128,
        width: usize,
        kind: &'static str,
    },

    /// Integer slot width outside of 1..=8.
    #[error("invalid integer width {0}, expected 1..=8 bytes")]
    InvalidWidth(usize),

    /// Malformed hex digest text.
    #[error("invalid digest: {0}")]
    InvalidDigest(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// UTF-8 decoding error.
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
