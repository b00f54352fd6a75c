//! Versioned binary snapshots of documents.
//!
//! A snapshot persists one document for later restoration, with the `entries`
//! array split out of the document text and written entry-by-entry so a large
//! listing never has to be re-serialized as one giant string. Two containers
//! share the payload layout: `CSNP` holds it raw, `CSNZ` wraps it in zstd
//! with the uncompressed size declared up front.
//!
//! Payload layout (after magic):
//!
//! ```text
//! version        u8
//! document       length-prefixed JSON text, `entries` removed
//! entry_count    signed varint; -1 means no entries field
//! entries        entry_count length-prefixed JSON texts
//! ```
//!
//! Decoding is safe on untrusted input: every length is bounded by the
//! constants in [`limits`](crate::limits) before allocation.

use std::io::Read;

use crate::document::{value_kind, Document, Value};
use crate::error::{DecodeError, EncodeError};
use crate::limits::{
    FORMAT_VERSION, MAGIC_COMPRESSED, MAGIC_UNCOMPRESSED, MAX_DOCUMENT_TEXT, MAX_ENTRY_COUNT,
    MAX_ENTRY_TEXT, MAX_SNAPSHOT_SIZE, MAX_VARINT_BYTES, MIN_FORMAT_VERSION,
};
use crate::model::Model;
use crate::pagination::FIELD_ENTRIES;

// =============================================================================
// DECODING
// =============================================================================

/// Decodes a snapshot back into a document.
///
/// Handles both compressed (`CSNZ`) and uncompressed (`CSNP`) containers.
pub fn decode(input: &[u8]) -> Result<Document, DecodeError> {
    if input.len() < 4 {
        return Err(DecodeError::UnexpectedEof { context: "magic" });
    }
    if &input[0..4] == MAGIC_COMPRESSED {
        let decompressed = decompress_zstd(&input[4..])?;
        decode_uncompressed(&decompressed)
    } else if &input[0..4] == MAGIC_UNCOMPRESSED {
        decode_uncompressed(input)
    } else {
        let mut found = [0u8; 4];
        found.copy_from_slice(&input[0..4]);
        Err(DecodeError::InvalidMagic { found })
    }
}

/// Decodes and rebuilds a typed model in one step.
pub fn restore_model<M: Model>(input: &[u8]) -> Result<M, DecodeError> {
    Ok(M::from_document(decode(input)?))
}

fn decode_uncompressed(input: &[u8]) -> Result<Document, DecodeError> {
    let mut reader = Reader::new(input);

    let magic = reader.read_bytes(4, "magic")?;
    if magic != MAGIC_UNCOMPRESSED {
        let mut found = [0u8; 4];
        found.copy_from_slice(magic);
        return Err(DecodeError::InvalidMagic { found });
    }

    let version = reader.read_byte("version")?;
    if version < MIN_FORMAT_VERSION || version > FORMAT_VERSION {
        return Err(DecodeError::UnsupportedVersion { version });
    }

    let text = reader.read_string(MAX_DOCUMENT_TEXT, "document")?;
    let mut doc = Document::parse(&text).map_err(|err| DecodeError::MalformedJson {
        context: "document",
        message: err.to_string(),
    })?;

    // A negative count means the document carried no entries field at all;
    // zero would instead restore an explicit empty array.
    let count = reader.read_signed_varint("entry_count")?;
    if count >= 0 {
        let count = count as usize;
        if count > MAX_ENTRY_COUNT {
            return Err(DecodeError::LengthExceedsLimit {
                field: "entry_count",
                len: count,
                max: MAX_ENTRY_COUNT,
            });
        }
        let mut entries = Vec::with_capacity(count.min(4096));
        for _ in 0..count {
            let entry_text = reader.read_string(MAX_ENTRY_TEXT, "entry")?;
            let entry: Value =
                serde_json::from_str(&entry_text).map_err(|err| DecodeError::MalformedJson {
                    context: "entry",
                    message: err.to_string(),
                })?;
            entries.push(entry);
        }
        doc.set(FIELD_ENTRIES, Value::Array(entries));
    }

    if !reader.is_empty() {
        return Err(DecodeError::TrailingBytes {
            remaining: reader.remaining_len(),
        });
    }

    Ok(doc)
}

fn decompress_zstd(compressed: &[u8]) -> Result<Vec<u8>, DecodeError> {
    let mut reader = Reader::new(compressed);
    let declared_size = reader.read_varint("uncompressed_size")? as usize;

    if declared_size > MAX_SNAPSHOT_SIZE {
        return Err(DecodeError::LengthExceedsLimit {
            field: "uncompressed_size",
            len: declared_size,
            max: MAX_SNAPSHOT_SIZE,
        });
    }

    let mut decoder = zstd::Decoder::new(reader.remaining())
        .map_err(|e| DecodeError::DecompressionFailed(e.to_string()))?;

    let mut decompressed = Vec::with_capacity(declared_size);
    decoder
        .read_to_end(&mut decompressed)
        .map_err(|e| DecodeError::DecompressionFailed(e.to_string()))?;

    if decompressed.len() != declared_size {
        return Err(DecodeError::UncompressedSizeMismatch {
            declared: declared_size,
            actual: decompressed.len(),
        });
    }

    Ok(decompressed)
}

// =============================================================================
// ENCODING
// =============================================================================

/// Encodes a document as an uncompressed snapshot.
pub fn encode(doc: &Document) -> Result<Vec<u8>, EncodeError> {
    let mut stripped = doc.clone();
    let entries = stripped.remove(FIELD_ENTRIES);

    let text = stripped.serialize();
    if text.len() > MAX_DOCUMENT_TEXT {
        return Err(EncodeError::LengthExceedsLimit {
            field: "document",
            len: text.len(),
            max: MAX_DOCUMENT_TEXT,
        });
    }

    let mut writer = Writer::with_capacity(16 + text.len());
    writer.write_bytes(MAGIC_UNCOMPRESSED);
    writer.write_byte(FORMAT_VERSION);
    writer.write_string(&text);

    match entries {
        Some(Value::Array(items)) if !items.is_empty() => {
            if items.len() > MAX_ENTRY_COUNT {
                return Err(EncodeError::LengthExceedsLimit {
                    field: "entry_count",
                    len: items.len(),
                    max: MAX_ENTRY_COUNT,
                });
            }
            writer.write_signed_varint(items.len() as i64);
            for item in &items {
                // Serializing an in-memory JSON value cannot fail.
                let entry_text = serde_json::to_string(item).unwrap();
                if entry_text.len() > MAX_ENTRY_TEXT {
                    return Err(EncodeError::LengthExceedsLimit {
                        field: "entry",
                        len: entry_text.len(),
                        max: MAX_ENTRY_TEXT,
                    });
                }
                writer.write_string(&entry_text);
            }
        }
        // Absent, explicit null, and empty all collapse to the sentinel.
        None | Some(Value::Null) | Some(Value::Array(_)) => {
            writer.write_signed_varint(-1);
        }
        Some(other) => {
            return Err(EncodeError::EntriesNotArray {
                found: value_kind(&other),
            });
        }
    }

    Ok(writer.into_bytes())
}

/// Encodes a document as a zstd-compressed snapshot.
pub fn encode_compressed(doc: &Document, level: i32) -> Result<Vec<u8>, EncodeError> {
    let uncompressed = encode(doc)?;

    let compressed = zstd::encode_all(uncompressed.as_slice(), level)
        .map_err(|e| EncodeError::CompressionFailed(e.to_string()))?;

    let mut writer = Writer::with_capacity(4 + MAX_VARINT_BYTES + compressed.len());
    writer.write_bytes(MAGIC_COMPRESSED);
    writer.write_varint(uncompressed.len() as u64);
    writer.write_bytes(&compressed);

    Ok(writer.into_bytes())
}

/// Encodes a typed model's backing document in one step.
pub fn snapshot_model<M: Model>(model: &M) -> Result<Vec<u8>, EncodeError> {
    encode(model.document())
}

// =============================================================================
// PRIMITIVES
// =============================================================================

/// Reader for decoding binary data.
///
/// Wraps a byte slice and provides methods for reading primitives with
/// bounds checking and error handling.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Creates a new reader from a byte slice.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Returns the remaining bytes.
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    /// Returns the number of remaining bytes.
    pub fn remaining_len(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Returns true if all data has been consumed.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Reads a single byte.
    #[inline]
    pub fn read_byte(&mut self, context: &'static str) -> Result<u8, DecodeError> {
        if self.pos >= self.data.len() {
            return Err(DecodeError::UnexpectedEof { context });
        }
        let byte = self.data[self.pos];
        self.pos += 1;
        Ok(byte)
    }

    /// Reads exactly n bytes.
    #[inline]
    pub fn read_bytes(&mut self, n: usize, context: &'static str) -> Result<&'a [u8], DecodeError> {
        if self.pos + n > self.data.len() {
            return Err(DecodeError::UnexpectedEof { context });
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    /// Reads an unsigned varint (LEB128).
    #[inline]
    pub fn read_varint(&mut self, context: &'static str) -> Result<u64, DecodeError> {
        let mut result: u64 = 0;
        let mut shift = 0;

        for i in 0..MAX_VARINT_BYTES {
            let byte = self.read_byte(context)?;
            let value = (byte & 0x7F) as u64;

            if shift >= 64 || (shift == 63 && value > 1) {
                return Err(DecodeError::VarintOverflow);
            }

            result |= value << shift;

            if byte & 0x80 == 0 {
                return Ok(result);
            }
            shift += 7;

            if i == MAX_VARINT_BYTES - 1 {
                return Err(DecodeError::VarintTooLong);
            }
        }

        Err(DecodeError::VarintTooLong)
    }

    /// Reads a signed varint (zigzag encoded).
    pub fn read_signed_varint(&mut self, context: &'static str) -> Result<i64, DecodeError> {
        let unsigned = self.read_varint(context)?;
        Ok(zigzag_decode(unsigned))
    }

    /// Reads a length-prefixed UTF-8 string.
    #[inline]
    pub fn read_string(
        &mut self,
        max_len: usize,
        field: &'static str,
    ) -> Result<String, DecodeError> {
        let len = self.read_varint(field)? as usize;
        if len > max_len {
            return Err(DecodeError::LengthExceedsLimit {
                field,
                len,
                max: max_len,
            });
        }
        let bytes = self.read_bytes(len, field)?;
        std::str::from_utf8(bytes)
            .map(|s| s.to_string())
            .map_err(|_| DecodeError::InvalidUtf8 { field })
    }
}

/// Writer for encoding binary data.
#[derive(Debug, Clone, Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    /// Creates a new writer.
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Creates a new writer with capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Returns the written bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Returns a reference to the written bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Writes a single byte.
    #[inline]
    pub fn write_byte(&mut self, byte: u8) {
        self.buf.push(byte);
    }

    /// Writes raw bytes.
    #[inline]
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Writes an unsigned varint (LEB128).
    #[inline]
    pub fn write_varint(&mut self, mut value: u64) {
        let mut buf = [0u8; MAX_VARINT_BYTES];
        let mut len = 0;
        loop {
            let mut byte = (value & 0x7F) as u8;
            value >>= 7;
            if value != 0 {
                byte |= 0x80;
            }
            buf[len] = byte;
            len += 1;
            if value == 0 {
                break;
            }
        }
        self.buf.extend_from_slice(&buf[..len]);
    }

    /// Writes a signed varint (zigzag encoded).
    pub fn write_signed_varint(&mut self, value: i64) {
        self.write_varint(zigzag_encode(value));
    }

    /// Writes a length-prefixed UTF-8 string.
    pub fn write_string(&mut self, s: &str) {
        self.write_varint(s.len() as u64);
        self.buf.extend_from_slice(s.as_bytes());
    }
}

/// Encodes a signed integer using zigzag encoding.
///
/// Maps negative numbers to odd positive numbers:
/// 0 -> 0, -1 -> 1, 1 -> 2, -2 -> 3, 2 -> 4, ...
#[inline]
pub fn zigzag_encode(n: i64) -> u64 {
    ((n << 1) ^ (n >> 63)) as u64
}

/// Decodes a zigzag-encoded unsigned integer back to signed.
#[inline]
pub fn zigzag_decode(n: u64) -> i64 {
    ((n >> 1) as i64) ^ (-((n & 1) as i64))
}
