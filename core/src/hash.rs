//! Hash and identity primitives
//!
//! Every commitment, signature and fingerprint in the protocol is a SHA-256
//! digest wrapped in [`Hash`]. Miners are addressed by their hex public key
//! through [`MinerId`], and value transfers go to an [`Address`] derived from it.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// 32-byte SHA-256 digest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Hash([u8; 32]);

impl Hash {
    /// All-zero hash, the fold seed for signature aggregation
    pub const ZERO: Hash = Hash([0u8; 32]);

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Hash(bytes)
    }

    /// Hash arbitrary bytes
    pub fn digest(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        Hash(hasher.finalize().into())
    }

    pub fn from_string(value: &str) -> Self {
        Self::digest(value.as_bytes())
    }

    /// Hash of another hash. This is the commitment relation: `out = Hash::of(&in)`.
    pub fn of(value: &Hash) -> Self {
        Self::digest(&value.0)
    }

    pub fn from_two_hashes(left: &Hash, right: &Hash) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(left.0);
        hasher.update(right.0);
        Hash(hasher.finalize().into())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Big-endian integer taken from the trailing 8 bytes
    pub fn to_u64(&self) -> u64 {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&self.0[24..32]);
        u64::from_be_bytes(bytes)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Hex-encoded public key of a (candidate) miner
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MinerId(String);

impl MinerId {
    pub fn new(public_key_hex: impl Into<String>) -> Self {
        MinerId(public_key_hex.into().to_lowercase())
    }

    pub fn from_public_key(public_key: &[u8]) -> Self {
        MinerId(hex::encode(public_key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Leading byte of the key text, used for deterministic ranking
    pub fn first_byte(&self) -> u8 {
        self.0.as_bytes().first().copied().unwrap_or(0)
    }

    /// First `limit` characters, the fallback alias of an unnamed producer
    pub fn short(&self, limit: usize) -> String {
        self.0.chars().take(limit).collect()
    }

    pub fn address(&self) -> Address {
        Address::from_miner(self)
    }
}

impl fmt::Display for MinerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MinerId {
    fn from(value: &str) -> Self {
        MinerId::new(value)
    }
}

/// Account address, derived from a public key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address(Hash);

impl Address {
    pub fn from_miner(miner: &MinerId) -> Self {
        Address(Hash::from_string(miner.as_str()))
    }

    pub fn to_hex(&self) -> String {
        self.0.to_hex()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
