//! SHA-256 content hashes for ledger blocks

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Length of the display form of a hash, in hex characters
pub const SHORT_HASH_LEN: usize = 16;

/// A SHA-256 hash (32 bytes)
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub [u8; 32]);

impl ContentHash {
    /// Hash arbitrary data
    pub fn digest(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        Self(hasher.finalize().into())
    }

    /// Hash `data` together with a preceding hash
    pub fn chain(previous: &ContentHash, data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(previous.0);
        hasher.update(data);
        Self(hasher.finalize().into())
    }

    /// Full hex representation
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Fixed-length display prefix
    pub fn short(&self) -> String {
        self.to_hex()[..SHORT_HASH_LEN].to_string()
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", self.short())
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.short())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_is_deterministic() {
        assert_eq!(ContentHash::digest(b"hello"), ContentHash::digest(b"hello"));
        assert_ne!(ContentHash::digest(b"hello"), ContentHash::digest(b"world"));
    }

    #[test]
    fn test_chain_depends_on_previous() {
        let a = ContentHash::digest(b"a");
        let b = ContentHash::digest(b"b");
        assert_ne!(ContentHash::chain(&a, b"x"), ContentHash::chain(&b, b"x"));
    }

    #[test]
    fn test_short_form() {
        let h = ContentHash::digest(b"block");
        assert_eq!(h.short().len(), SHORT_HASH_LEN);
        assert_eq!(h.to_string(), h.short());
        assert!(h.to_hex().starts_with(&h.short()));
    }
}
