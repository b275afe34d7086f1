//! Error types for CX decoding, encoding and projection.

use thiserror::Error;

/// Errors that can occur when reading, writing or projecting CX files.
#[derive(Debug, Error)]
pub enum Error {
    /// Primitive codec error (truncated input, wide strings, ...).
    #[error(transparent)]
    Common(#[from] teacx_common::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A node type that has no textual projection.
    #[error("unknown node type {0}")]
    UnknownNodeType(String),

    /// A structured record lacks a required key.
    #[error("missing field `{field}`")]
    MissingField { field: String },

    /// A name does not survive the markup name-escaping transform.
    #[error("name {name:?} cannot be escaped without colliding with the escape token")]
    NameEscapingCollision { name: String },

    /// A comment that cannot be written as a well-formed markup comment.
    #[error("comment {content:?} cannot be rendered: {reason}")]
    InvalidComment {
        content: String,
        reason: &'static str,
    },

    /// Markup parsing or writing error.
    #[error("XML error: {0}")]
    Xml(String),

    /// JSON parsing or writing error.
    #[cfg(feature = "json-output")]
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Check if the error is caused by input ending before a declared field.
    pub fn is_truncated(&self) -> bool {
        matches!(
            self,
            Error::Common(teacx_common::Error::TruncatedInput { .. })
        )
    }
}

/// Result type for CX operations.
pub type Result<T> = std::result::Result<T, Error>;
