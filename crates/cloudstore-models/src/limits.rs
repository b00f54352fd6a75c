//! Security limits for snapshot decoding.
//!
//! All snapshot allocations are bounded by these constants so the decoder can
//! safely handle untrusted input.

/// Magic bytes for an uncompressed snapshot.
pub const MAGIC_UNCOMPRESSED: &[u8; 4] = b"CSNP";

/// Magic bytes for a zstd-compressed snapshot.
pub const MAGIC_COMPRESSED: &[u8; 4] = b"CSNZ";

/// Current snapshot format version.
pub const FORMAT_VERSION: u8 = 1;

/// Minimum snapshot format version this crate can decode.
pub const MIN_FORMAT_VERSION: u8 = 1;

/// Maximum encoded length of a varint (64-bit).
pub const MAX_VARINT_BYTES: usize = 10;

/// Maximum byte length of the stripped document text.
pub const MAX_DOCUMENT_TEXT: usize = 64 * 1024 * 1024;

/// Maximum byte length of a single serialized entry.
pub const MAX_ENTRY_TEXT: usize = 16 * 1024 * 1024;

/// Maximum number of entries in one snapshot.
pub const MAX_ENTRY_COUNT: usize = 1_000_000;

/// Maximum decompressed size of a compressed snapshot.
pub const MAX_SNAPSHOT_SIZE: usize = 256 * 1024 * 1024;
