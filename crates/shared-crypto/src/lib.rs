//! # Shared Crypto
//!
//! Hash primitives used by the codec, filter and wallet crates. Each is a
//! pure function with a fixed input/output byte contract.
//!
//! | Function | Output | Used by |
//! |----------|--------|---------|
//! | [`sha256`] | 32 bytes | subchain and pattern ids |
//! | [`sha256d`] | 32 bytes | txid, block hash, filter hash/header |
//! | [`hash160`] | 20 bytes | P2SH redeem-script elements |
//! | [`siphash24`] | `u64` | GCS element hashing |
//! | [`murmur3_32`] | `u32` | Bloom filter rounds |

pub mod errors;
pub mod hashing;

pub use errors::CryptoError;
pub use hashing::{
    hash160, murmur3_32, sha256, sha256_many, sha256d, sha256d_many, siphash24, siphash24_slice,
    Hash160, SipKey, SIPHASH_KEY_SIZE,
};
