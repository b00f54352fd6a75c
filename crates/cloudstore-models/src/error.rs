//! Error types for document parsing, typed access, and snapshot encoding/decoding.

use thiserror::Error;

/// Error while parsing raw text into a [`Document`](crate::Document).
///
/// These are fatal to the parse call and surfaced to the caller; a document
/// that fails here yields no entity at all.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DocumentError {
    #[error("malformed document: {0}")]
    Malformed(String),

    #[error("top-level JSON value is {found}, expected an object")]
    NotAnObject { found: &'static str },
}

impl From<serde_json::Error> for DocumentError {
    fn from(err: serde_json::Error) -> Self {
        DocumentError::Malformed(err.to_string())
    }
}

/// Error from a typed accessor invoked against an incompatible field.
///
/// Both variants indicate a caller/schema bug rather than a recoverable
/// per-call condition: requesting a sequence from a scalar, or indexing past
/// the end of a page, is a contract violation and is never silently nulled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    #[error("type mismatch for field {field:?}: expected {expected}, found {found}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("index {index} out of range (size: {size})")]
    IndexOutOfRange { index: usize, size: usize },
}

/// Error during snapshot decoding.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("invalid magic bytes: expected CSNP or CSNZ, found {found:?}")]
    InvalidMagic { found: [u8; 4] },

    #[error("unsupported snapshot version: {version}")]
    UnsupportedVersion { version: u8 },

    #[error("unexpected end of input while reading {context}")]
    UnexpectedEof { context: &'static str },

    #[error("varint exceeds maximum length (10 bytes)")]
    VarintTooLong,

    #[error("varint overflow (value exceeds u64)")]
    VarintOverflow,

    #[error("{field} length {len} exceeds maximum {max}")]
    LengthExceedsLimit {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("invalid UTF-8 in {field}")]
    InvalidUtf8 { field: &'static str },

    #[error("malformed JSON in {context}: {message}")]
    MalformedJson {
        context: &'static str,
        message: String,
    },

    #[error("{remaining} trailing bytes after snapshot payload")]
    TrailingBytes { remaining: usize },

    #[error("zstd decompression failed: {0}")]
    DecompressionFailed(String),

    #[error("decompressed size {actual} doesn't match declared {declared}")]
    UncompressedSizeMismatch { declared: usize, actual: usize },
}

/// Error during snapshot encoding.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodeError {
    #[error("{field} length {len} exceeds maximum {max}")]
    LengthExceedsLimit {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("entries field is {found}, expected an array")]
    EntriesNotArray { found: &'static str },

    #[error("zstd compression failed: {0}")]
    CompressionFailed(String),
}
