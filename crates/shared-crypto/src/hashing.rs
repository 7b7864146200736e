//! # Hashing
//!
//! SHA-256 family, HASH160, SipHash-2-4 and MurmurHash3.

use ripemd::Ripemd160;
use sha2::{Digest, Sha256};
use siphasher::sip::SipHasher24;
use std::hash::Hasher;
use std::io::Cursor;

use crate::errors::CryptoError;

/// 32-byte digest.
pub type Hash = [u8; 32];

/// RIPEMD160(SHA256(x)).
pub type Hash160 = [u8; 20];

/// SipHash key size in bytes.
pub const SIPHASH_KEY_SIZE: usize = 16;

/// SipHash key.
pub type SipKey = [u8; SIPHASH_KEY_SIZE];

/// Single SHA-256.
pub fn sha256(data: &[u8]) -> Hash {
    Sha256::digest(data).into()
}

/// SHA-256 over the concatenation of several inputs.
pub fn sha256_many(inputs: &[&[u8]]) -> Hash {
    let mut hasher = Sha256::new();
    for input in inputs {
        hasher.update(input);
    }
    hasher.finalize().into()
}

/// Double SHA-256, the Bitcoin block/transaction hash.
pub fn sha256d(data: &[u8]) -> Hash {
    let first = Sha256::digest(data);
    Sha256::digest(first).into()
}

/// Double SHA-256 over the concatenation of several inputs.
pub fn sha256d_many(inputs: &[&[u8]]) -> Hash {
    let mut hasher = Sha256::new();
    for input in inputs {
        hasher.update(input);
    }
    let first = hasher.finalize();
    Sha256::digest(first).into()
}

/// RIPEMD160 of SHA-256.
pub fn hash160(data: &[u8]) -> Hash160 {
    let first = Sha256::digest(data);
    Ripemd160::digest(first).into()
}

/// SipHash-2-4 of `data` under a 16-byte key.
pub fn siphash24(key: &SipKey, data: &[u8]) -> u64 {
    let mut hasher = SipHasher24::new_with_key(key);
    hasher.write(data);
    hasher.finish()
}

/// SipHash-2-4 with a key of unchecked length.
pub fn siphash24_slice(key: &[u8], data: &[u8]) -> Result<u64, CryptoError> {
    let key: &SipKey = key.try_into().map_err(|_| CryptoError::InvalidKeyLength {
        expected: SIPHASH_KEY_SIZE,
        actual: key.len(),
    })?;
    Ok(siphash24(key, data))
}

/// MurmurHash3 (x86, 32-bit).
pub fn murmur3_32(data: &[u8], seed: u32) -> u32 {
    let mut cursor = Cursor::new(data);
    // Reading from an in-memory cursor cannot fail.
    murmur3::murmur3_32(&mut cursor, seed).unwrap_or(0)
}
