//! Cryptographic hash functions.

use sha2::{Digest, Sha256};

/// Hash length-prefixed parts and reduce the digest into `0..space`.
///
/// Parts are length-prefixed so ("ab", "c") and ("a", "bc") differ.
pub fn hash_to_index(parts: &[&[u8]], space: u8) -> u8 {
    assert!(space > 0, "index space must be non-empty");

    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update((part.len() as u64).to_le_bytes());
        hasher.update(part);
    }
    let digest: [u8; 32] = hasher.finalize().into();

    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    (u64::from_be_bytes(head) % u64::from(space)) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_to_index_is_deterministic_and_bounded() {
        for nonce in 0u64..200 {
            let nonce = nonce.to_le_bytes();
            let a = hash_to_index(&[b"seed", b"ORACLE_1", &nonce], 10);
            let b = hash_to_index(&[b"seed", b"ORACLE_1", &nonce], 10);
            assert_eq!(a, b);
            assert!(a < 10);
        }
    }

    #[test]
    fn test_hash_to_index_parts_are_framed() {
        let digests: Vec<u8> = (0u8..32)
            .map(|n| hash_to_index(&[b"ab", b"c", &[n]], 251))
            .collect();
        let shifted: Vec<u8> = (0u8..32)
            .map(|n| hash_to_index(&[b"a", b"bc", &[n]], 251))
            .collect();
        assert_ne!(digests, shifted);
    }
}
