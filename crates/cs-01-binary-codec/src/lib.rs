//! # CS-01 Binary Codec
//!
//! Byte-level primitives shared by every wire parser in the workspace.
//!
//! ## Components
//!
//! - [`CompactSize`]: Bitcoin variable-length unsigned integer.
//! - [`ByteReader`]: cursor over a borrowed buffer. Every read first grows
//!   an expected-size accumulator and compares it with the buffer length, so
//!   a truncated payload fails with [`CodecError::Truncated`] before any
//!   out-of-range access.
//! - [`ByteWriter`]: the matching little-endian encoder.
//!
//! ## Invariants
//!
//! - `CompactSize::decode_from_payload(&CompactSize::new(v).encode()) == v`
//! - `CompactSize::new(v).encode()` is always the minimal width.
//! - No reader method ever indexes past the end of its buffer.

pub mod compact_size;
pub mod error;
pub mod reader;
pub mod writer;

pub use compact_size::CompactSize;
pub use error::CodecError;
pub use reader::ByteReader;
pub use writer::ByteWriter;
