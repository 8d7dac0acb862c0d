// crates/light-core/src/crypto.rs

use sha2::{Digest, Sha256};

/// Compute the SHA-256 hash of arbitrary bytes.
pub fn hash_bytes(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_bytes() {
        let data = b"light";
        let hash = hash_bytes(data);
        assert_eq!(hash.len(), 32);

        // Same input should produce same hash
        let hash2 = hash_bytes(data);
        assert_eq!(hash, hash2);

        // Different input should produce different hash
        let hash3 = hash_bytes(b"different");
        assert_ne!(hash, hash3);
    }
}
