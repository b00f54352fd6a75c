//! Typed data-model layer for the cloudstore API client.
//!
//! Server responses are dynamic JSON documents; this crate wraps them in
//! typed models without ever flattening them into structs. Every model owns
//! its raw [`Document`], converts fields lazily through a memoizing
//! [`PropertyCache`], and re-serializes with unknown fields and key order
//! intact.
//!
//! # Quick Start
//!
//! ```rust
//! use cloudstore_models::{Folder, Item, Model};
//!
//! let folder = Folder::from_json(
//!     r#"{"type":"folder","id":"42","name":"Docs","size":1024}"#,
//! ).unwrap();
//!
//! assert_eq!(folder.entity().id().unwrap().as_deref(), Some("42"));
//! assert_eq!(folder.name().unwrap().as_deref(), Some("Docs"));
//! assert_eq!(folder.size().unwrap(), Some(1024));
//!
//! // The document round-trips byte-for-byte.
//! assert_eq!(
//!     folder.to_json(),
//!     r#"{"type":"folder","id":"42","name":"Docs","size":1024}"#,
//! );
//! ```
//!
//! # Modules
//!
//! - [`document`]: Ordered dynamic JSON documents
//! - [`cache`]: Lazy typed-property cache with write invalidation
//! - [`model`]: Typed models, the [`Model`] seam, and variant dispatch
//! - [`pagination`]: Paginated listings of typed entries
//! - [`snapshot`]: Versioned binary persistence with optional compression
//! - [`error`]: Error types
//! - [`limits`]: Security limits for snapshot decoding
//!
//! # Security
//!
//! The snapshot decoder is designed to safely handle untrusted input:
//! - All allocations are bounded by the limits in [`limits`]
//! - Varints are limited to prevent overflow
//! - Invalid data is rejected with descriptive errors
//!
//! # Wire Format
//!
//! Snapshots use a binary container with optional zstd compression:
//! - Uncompressed: `CSNP` magic + version + data
//! - Compressed: `CSNZ` magic + uncompressed size + zstd data
//!
//! The decoder automatically detects and handles both formats.

pub mod cache;
pub mod document;
pub mod error;
pub mod limits;
pub mod model;
pub mod pagination;
pub mod snapshot;
pub mod util;

// Re-export commonly used types at crate root
pub use cache::PropertyCache;
pub use document::{value_kind, Document, Value};
pub use error::{AccessError, DecodeError, DocumentError, EncodeError};
pub use model::{
    register, Collection, Entity, File, Folder, Item, Model, ModelObject, SortOrder, SyncState,
};
pub use pagination::PaginatedCollection;
pub use snapshot::{decode, encode, encode_compressed, restore_model, snapshot_model};
pub use util::timestamp::{Timestamp, TimestampParseError};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
