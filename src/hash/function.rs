//! Pluggable hash functions applied to canonical encodings.

use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::Arc;
use xxhash_rust::xxh3::{xxh3_128, xxh3_64};

/// HashToken is the fixed-size result of hashing a canonical encoding.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HashToken {
    /// Hex digest of a cryptographic hash.
    Hex(String),
    U64(u64),
    U128(u128),
    /// The canonical encoding itself, when hashing is disabled.
    Raw(String),
}

impl fmt::Display for HashToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashToken::Hex(s) | HashToken::Raw(s) => f.write_str(s),
            HashToken::U64(v) => write!(f, "{:016x}", v),
            HashToken::U128(v) => write!(f, "{:032x}", v),
        }
    }
}

/// HashFunction turns a canonical encoding into a HashToken.
pub trait HashFunction: fmt::Debug + Send + Sync {
    /// Short name used in option documents.
    fn name(&self) -> &str;

    fn hash(&self, canonical: &str) -> HashToken;
}

/// SHA-256 hex digests.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Hasher;

impl HashFunction for Sha256Hasher {
    fn name(&self) -> &str {
        "sha256"
    }

    fn hash(&self, canonical: &str) -> HashToken {
        HashToken::Hex(hex::encode(Sha256::digest(canonical.as_bytes())))
    }
}

/// BLAKE3 hex digests.
#[derive(Debug, Clone, Copy, Default)]
pub struct Blake3Hasher;

impl HashFunction for Blake3Hasher {
    fn name(&self) -> &str {
        "blake3"
    }

    fn hash(&self, canonical: &str) -> HashToken {
        HashToken::Hex(blake3::hash(canonical.as_bytes()).to_hex().to_string())
    }
}

/// Non-cryptographic 64-bit XXH3.
#[derive(Debug, Clone, Copy, Default)]
pub struct Xxh3Hasher64;

impl HashFunction for Xxh3Hasher64 {
    fn name(&self) -> &str {
        "xxh3_64"
    }

    fn hash(&self, canonical: &str) -> HashToken {
        HashToken::U64(xxh3_64(canonical.as_bytes()))
    }
}

/// Non-cryptographic 128-bit XXH3.
#[derive(Debug, Clone, Copy, Default)]
pub struct Xxh3Hasher128;

impl HashFunction for Xxh3Hasher128 {
    fn name(&self) -> &str {
        "xxh3_128"
    }

    fn hash(&self, canonical: &str) -> HashToken {
        HashToken::U128(xxh3_128(canonical.as_bytes()))
    }
}

/// Returns the canonical encoding unchanged, for inspecting encodings.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughHasher;

impl HashFunction for PassthroughHasher {
    fn name(&self) -> &str {
        "none"
    }

    fn hash(&self, canonical: &str) -> HashToken {
        HashToken::Raw(canonical.to_string())
    }
}

/// Looks up a built-in hash function by name.
pub fn hasher_by_name(name: &str) -> Option<Arc<dyn HashFunction>> {
    match name {
        "sha256" => Some(Arc::new(Sha256Hasher)),
        "blake3" => Some(Arc::new(Blake3Hasher)),
        "xxh3_64" => Some(Arc::new(Xxh3Hasher64)),
        "xxh3_128" => Some(Arc::new(Xxh3Hasher128)),
        "none" => Some(Arc::new(PassthroughHasher)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_digest() {
        let token = Sha256Hasher.hash("abc");
        assert_eq!(
            token.to_string(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_hashers_are_deterministic() {
        for name in ["sha256", "blake3", "xxh3_64", "xxh3_128", "none"] {
            let hasher = hasher_by_name(name).unwrap();
            assert_eq!(hasher.name(), name);
            assert_eq!(hasher.hash("dict:{}"), hasher.hash("dict:{}"));
            assert_ne!(hasher.hash("int:1"), hasher.hash("int:2"));
        }
    }

    #[test]
    fn test_fixed_width_display() {
        assert_eq!(Xxh3Hasher64.hash("x").to_string().len(), 16);
        assert_eq!(Xxh3Hasher128.hash("x").to_string().len(), 32);
        assert_eq!(Blake3Hasher.hash("x").to_string().len(), 64);
    }

    #[test]
    fn test_passthrough_keeps_encoding() {
        assert_eq!(PassthroughHasher.hash("str:a"), HashToken::Raw("str:a".into()));
    }

    #[test]
    fn test_unknown_name() {
        assert!(hasher_by_name("md5").is_none());
    }
}
